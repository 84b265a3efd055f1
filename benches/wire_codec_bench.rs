//! Throughput of the wire codec's hot paths: varint/zigzag round trips,
//! producer-side encoding of a representative frame, and decoding that
//! frame back out against a no-op stage.

use canvas_stream::canvas::Canvas;
use canvas_stream::cancel::Cancel;
use canvas_stream::color::Color;
use canvas_stream::config::StageConfig;
use canvas_stream::decoder::Decoder;
use canvas_stream::producer::RemoteCanvas;
use canvas_stream::stage::RenderingStage;
use canvas_stream::transform::AffineMatrix;
use canvas_stream::transport::ChannelTransport;
use canvas_stream::wire::varint::{read_uvarint, read_zigzag32, write_uvarint, write_zigzag32};

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};

#[derive(Default)]
struct NullCanvas;

impl Canvas for NullCanvas {
    fn save(&mut self) {}
    fn restore(&mut self) {}
    fn set_matrix(&mut self, _matrix: AffineMatrix) {}
    fn clear(&mut self) {}
    fn draw_polygon(&mut self, _points: &[(i32, i32)], _stroke: Color, _thickness: u32) {}
    fn draw_text(&mut self, _text: &str, _x: i32, _y: i32, _color: Color, _font_size: u32) {}
    fn draw_circle(&mut self, _cx: i32, _cy: i32, _radius: u32, _stroke: Color, _thickness: u32) {}
    fn draw_rect(&mut self, _x: i32, _y: i32, _w: u32, _h: u32, _stroke: Color, _thickness: u32) {}
    fn draw_line(&mut self, _x1: i32, _y1: i32, _x2: i32, _y2: i32, _stroke: Color, _thickness: u32) {}
}

fn bench_varint_round_trip(c: &mut Criterion) {
    let mut group = c.benchmark_group("uvarint_round_trip");
    for value in [0u64, 127, 16_384, u64::from(u32::MAX)] {
        group.bench_with_input(BenchmarkId::from_parameter(value), &value, |b, &value| {
            b.iter(|| {
                let mut buf = Vec::with_capacity(10);
                write_uvarint(std::hint::black_box(value), &mut buf);
                read_uvarint(&buf, "bench").unwrap().unwrap()
            });
        });
    }
    group.finish();
}

fn bench_zigzag_round_trip(c: &mut Criterion) {
    c.bench_function("zigzag32_round_trip", |b| {
        b.iter(|| {
            let mut buf = Vec::with_capacity(5);
            write_zigzag32(std::hint::black_box(-123_456), &mut buf);
            read_zigzag32(&buf, "bench").unwrap().unwrap()
        });
    });
}

/// Builds the wire bytes for a single message: one layer, a closed polygon
/// (forcing delta encoding across several points), a rectangle, and a
/// styling update, roughly representative of one animation tick.
fn encode_sample_frame() -> Vec<u8> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap();
    runtime.block_on(async {
        let mut producer = RemoteCanvas::new();
        producer.begin_frame();
        let mut layer = producer.layer(0);
        layer.set_stroke(Color::rgba(255, 0, 0, 255)).unwrap();
        layer
            .draw_polygon(&[(0, 0), (50, 0), (50, 50), (0, 50), (0, 0)])
            .unwrap();
        layer.draw_rectangle(10, 10, 200, 100).unwrap();
        drop(layer);

        let (mut transport, mut rx) = ChannelTransport::channel(1);
        producer.flush(&mut transport, &Cancel::new()).await.unwrap();
        rx.try_recv().unwrap()
    })
}

fn bench_encode_frame(c: &mut Criterion) {
    c.bench_function("encode_single_layer_frame", |b| {
        b.iter(encode_sample_frame);
    });
}

fn bench_decode_frame(c: &mut Criterion) {
    let bytes = encode_sample_frame();
    c.bench_function("decode_single_layer_frame", |b| {
        b.iter(|| {
            let mut decoder = Decoder::new();
            let mut stage: RenderingStage<NullCanvas> = RenderingStage::new(StageConfig::default());
            decoder.decode(std::hint::black_box(&bytes), &mut stage).unwrap()
        });
    });
}

criterion_group!(
    benches,
    bench_varint_round_trip,
    bench_zigzag_round_trip,
    bench_encode_frame,
    bench_decode_frame
);
criterion_main!(benches);
