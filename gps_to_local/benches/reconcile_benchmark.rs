use criterion::{criterion_group, criterion_main, Criterion};
use gps_to_local::*;
use std::hint::black_box;

const GGA: &[u8] = b"$GPGGA,123519,4807.038,N,01131.000,E,1,08,0.9,545.4,M,46.9,M,,*47\r\n";

const FRAMES: &str = r#"{
    "coordinate_frames": {
        "body": {"relative_to": "local", "update_channel": "POSE"},
        "gps18": {"relative_to": "body", "initial_transform": {"translation": [0.3, 0.0, 1.5]}}
    }
}"#;

fn split_all(data: &[u8], chunk_size: usize) -> usize {
    let mut splitter = SentenceSplitter::new();
    let mut count = 0;
    for chunk in data.chunks(chunk_size) {
        for sentence in splitter.consume(chunk) {
            match sentence {
                Ok(_) => count += 1,
                Err(e) => panic!("No errors allowed! got: {:?}", e),
            }
        }
    }
    count
}

pub fn criterion_benchmark(c: &mut Criterion) {
    let data = GGA.repeat(1000);
    for chunk in &[1, 64, 256, 1024] {
        c.bench_function(&format!("split_gga_{}", chunk), |b| {
            b.iter(|| assert_eq!(split_all(black_box(&data), *chunk), 1000))
        });
    }

    c.bench_function("decode_gga", |b| {
        let sentence = std::str::from_utf8(&GGA[..GGA.len() - 2]).unwrap();
        b.iter(|| decode_sentence(black_box(sentence), 1_000_000).unwrap())
    });

    c.bench_function("decode_and_reconcile", |b| {
        let config: FramesConfig = serde_json::from_str(FRAMES).unwrap();
        let mut graph = FrameGraph::from_config(&config).unwrap();
        let pose = PoseMessage {
            utime: 0,
            pos: [5.0, -3.0, 0.2],
            orientation: PoseMessage::IDENTITY_ORIENTATION,
        };
        graph.handle_pose("POSE", &pose).unwrap();
        let reconciler = FixReconciler::new("body", "local");
        let message = NmeaMessage {
            utime: 1_000_000,
            nmea: String::from_utf8(GGA.to_vec()).unwrap(),
        };
        let mut published: Vec<OutboundMessage> = Vec::with_capacity(1);
        let mut latest = None;
        b.iter(|| {
            let fix = NmeaDecoder.decode(black_box(&message)).unwrap();
            reconciler.handle_fix(&fix, &graph, &mut published, &mut latest);
            published.clear();
        })
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
