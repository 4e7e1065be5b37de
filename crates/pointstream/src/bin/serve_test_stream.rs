//! Serve a synthetic animated point cloud over WebSocket.
//!
//! Each connected client receives one compressed frame per tick. The point
//! count swells and shrinks over time and colors switch off every few
//! seconds, which exercises buffer growth, reuse and color transitions.
//!
//! Run: `cargo run -p pointstream --features test-tools --bin serve_test_stream -- [addr] [points] [fps]`

use std::env;
use std::f32::consts::TAU;
use std::time::Duration;

use futures_util::SinkExt;
use pointstream_codec::{DecodedFrame, compress, encode};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::Message;

const DEFAULT_ADDR: &str = "127.0.0.1:9001";
const DEFAULT_POINTS: u32 = 20_000;
const DEFAULT_FPS: u64 = 30;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();
    let addr = args.get(1).map_or(DEFAULT_ADDR, String::as_str).to_string();
    let max_points = args
        .get(2)
        .map_or(Ok(DEFAULT_POINTS), |s| s.parse())?;
    let fps = args.get(3).map_or(Ok(DEFAULT_FPS), |s| s.parse())?.max(1);

    let listener = TcpListener::bind(&addr).await?;
    println!("Serving up to {max_points} points at {fps} fps on ws://{addr}");

    loop {
        let (tcp, peer) = listener.accept().await?;
        println!("Client connected: {peer}");
        tokio::spawn(async move {
            if let Err(e) = serve_client(tcp, max_points, fps).await {
                println!("Client {peer} disconnected: {e}");
            }
        });
    }
}

async fn serve_client(
    tcp: TcpStream,
    max_points: u32,
    fps: u64,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut socket = tokio_tungstenite::accept_async(tcp).await?;
    let mut ticker = tokio::time::interval(Duration::from_millis(1000 / fps));
    let mut tick: u64 = 0;

    loop {
        ticker.tick().await;
        #[allow(clippy::cast_precision_loss)]
        let t = tick as f32 / fps as f32;
        let frame = synth_frame(max_points, t);
        let payload = compress(&encode(&frame), 6);
        socket.send(Message::binary(payload)).await?;
        tick += 1;
    }
}

/// A rippling disc whose point count breathes between half and full size.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
fn synth_frame(max_points: u32, t: f32) -> DecodedFrame {
    let breathe = 0.75 + 0.25 * (t * 0.5).sin();
    let points = (max_points as f32 * breathe) as u32;
    let colored = (t as u32 / 4) % 3 != 2;

    let mut positions = Vec::with_capacity(points as usize * 3);
    let mut colors = Vec::with_capacity(if colored { points as usize * 3 } else { 0 });
    for i in 0..points {
        let u = i as f32 / max_points.max(1) as f32;
        let radius = u.sqrt() * 10.0;
        let angle = i as f32 * 2.399_963;
        let x = radius * angle.cos();
        let z = radius * angle.sin();
        let y = (radius - t * 3.0).sin() * (1.0 - u);
        positions.extend_from_slice(&[x, y, z]);
        if colored {
            let hue = (angle / TAU + t * 0.1).fract();
            colors.extend_from_slice(&[
                (255.0 * hue) as u8,
                (255.0 * (0.5 + 0.5 * y)) as u8,
                (255.0 * (1.0 - hue)) as u8,
            ]);
        }
    }

    DecodedFrame::new(points, positions, colored.then_some(colors))
        .unwrap_or_else(|_| DecodedFrame::empty())
}
