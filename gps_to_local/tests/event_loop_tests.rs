use std::{
    io::Cursor,
    sync::mpsc::channel,
    time::{Duration, Instant},
};

use gps_to_local::{
    transport::spawn_line_source, AppContext, Config, Event, FrameConfigError, FrameError,
    GpsToLocalEstimate, Lifecycle, NmeaDecoder, NmeaMessage, OutboundMessage, PoseMessage,
    RunOptions, StartupError,
};

const FRAMES: &str = r#"{
    "root_frame": "local",
    "coordinate_frames": {
        "body": {"relative_to": "local", "update_channel": "POSE"},
        "gps18": {
            "relative_to": "body",
            "initial_transform": {"translation": [0.3, 0.0, 1.5], "rpy": [0.0, 0.0, 0.0]}
        }
    }
}"#;

const FIX_37_N_122_W: &str =
    "$GPGGA,000000.00,3700.0000,N,12200.0000,W,1,08,0.9,10.0,M,0.0,M,,*7B";

fn config(json: &str) -> Config {
    serde_json::from_str(json).unwrap()
}

fn app(options: RunOptions) -> AppContext<NmeaDecoder, Vec<OutboundMessage>> {
    AppContext::initialize(&config(FRAMES), options, NmeaDecoder, recorder()).unwrap()
}

fn recorder() -> Vec<OutboundMessage> {
    Vec::new()
}

fn nmea(utime: i64, nmea: &str) -> Event {
    Event::Nmea(NmeaMessage {
        utime,
        nmea: nmea.to_string(),
    })
}

fn pose(utime: i64, pos: [f64; 3]) -> Event {
    Event::Pose {
        channel: "POSE".to_string(),
        pose: PoseMessage {
            utime,
            pos,
            orientation: PoseMessage::IDENTITY_ORIENTATION,
        },
    }
}

#[test]
fn fixes_before_first_pose_are_dropped() {
    let (tx, rx) = channel();
    for event in [
        nmea(500_000, FIX_37_N_122_W),
        pose(900_000, [5.0, -3.0, 0.2]),
        nmea(1_000_000, FIX_37_N_122_W),
        Event::SourceClosed("test".to_string()),
    ] {
        tx.send(event).unwrap();
    }

    let mut app = app(RunOptions::default());
    app.start(1, Instant::now()).unwrap();
    app.run(&rx);

    assert_eq!(app.state(), Lifecycle::ShuttingDown);
    assert_eq!(
        *app.publisher(),
        vec![OutboundMessage::GpsToLocal(GpsToLocalEstimate {
            utime: 1_000_000,
            lat_lon_el_theta: [37.0, -122.0, 10.0, 0.0],
            local: [5.0, -3.0, 0.2],
        })]
    );
}

#[test]
fn bad_input_is_skipped() {
    let (tx, rx) = channel();
    let bad_pose = Event::Pose {
        channel: "POSE".to_string(),
        pose: PoseMessage {
            utime: 1,
            pos: [9.0; 3],
            orientation: [0.0; 4],
        },
    };
    for event in [
        pose(1, [1.0, 2.0, 3.0]),
        nmea(2, "$GPGGA,broken"),
        nmea(3, "$GPRMC,123519,A,4807.038,N,01131.000,E,022.4,084.4,230394,003.1,W*6A"),
        nmea(4, "$GPGGA,123519,,,,,0,00,,,M,,M,,"),
        bad_pose,
        nmea(5, FIX_37_N_122_W),
        Event::Shutdown,
        nmea(6, FIX_37_N_122_W),
    ] {
        tx.send(event).unwrap();
    }

    let mut app = app(RunOptions::default());
    app.start(1, Instant::now()).unwrap();
    app.run(&rx);

    // the malformed pose left the previous one in place; nothing after shutdown
    assert_eq!(app.publisher().len(), 1);
    assert!(matches!(
        &app.publisher()[0],
        OutboundMessage::GpsToLocal(e) if e.utime == 5 && e.local == [1.0, 2.0, 3.0]
    ));
}

#[test]
fn stale_pose_drops_fix() {
    let mut cfg = config(FRAMES);
    cfg.frames.max_pose_age_us = Some(100_000);
    let mut app =
        AppContext::initialize(&cfg, RunOptions::default(), NmeaDecoder, recorder()).unwrap();
    app.start(1, Instant::now()).unwrap();

    app.handle_event(pose(1_000_000, [1.0, 0.0, 0.0]));
    app.handle_event(nmea(1_050_000, FIX_37_N_122_W));
    app.handle_event(nmea(1_200_000, FIX_37_N_122_W));

    assert_eq!(app.publisher().len(), 1);
    assert_eq!(app.latest_sample().map(|s| s.utime), Some(1_050_000));
}

#[test]
fn rebroadcast_publishes_last_sample() {
    let start = Instant::now();
    let mut app = app(RunOptions {
        publish_global_to_local: true,
        global_to_local_hz: 10.0,
    });
    app.start(1, start).unwrap();

    // no fix yet
    app.poll_timer(start + Duration::from_millis(100));
    assert!(app.publisher().is_empty());

    app.handle_event(pose(1, [5.0, -3.0, 0.2]));
    app.handle_event(nmea(1_000_000, FIX_37_N_122_W));
    app.poll_timer(start + Duration::from_millis(200));
    app.poll_timer(start + Duration::from_millis(300));

    let global = OutboundMessage::GlobalToLocal(PoseMessage {
        utime: 1_000_000,
        pos: [5.0, -3.0, 0.2],
        orientation: [1.0, 0.0, 0.0, 0.0],
    });
    assert_eq!(app.publisher().len(), 3);
    assert_eq!(app.publisher()[1], global);
    assert_eq!(app.publisher()[2], global);
}

#[test]
fn rebroadcast_runs_from_event_loop() {
    let (tx, rx) = channel();
    let mut app = app(RunOptions {
        publish_global_to_local: true,
        global_to_local_hz: 100.0,
    });
    app.start(1, Instant::now()).unwrap();
    tx.send(pose(1, [1.0, 1.0, 1.0])).unwrap();
    tx.send(nmea(7, FIX_37_N_122_W)).unwrap();

    let stopper = std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(200));
        tx.send(Event::Shutdown).unwrap();
    });
    app.run(&rx);
    stopper.join().unwrap();

    let globals = app
        .publisher()
        .iter()
        .filter(|m| matches!(m, OutboundMessage::GlobalToLocal(p) if p.utime == 7))
        .count();
    assert!(globals >= 2, "only {} global poses", globals);
}

#[test]
fn line_source_feeds_the_loop() {
    let input = format!(
        "{}\n{}\n{}\n",
        r#"{"channel": "POSE", "utime": 10, "pos": [2.0, 0.0, 0.0], "orientation": [1, 0, 0, 0]}"#,
        r#"{"channel": "NMEA", "utime": 20, "nmea": "$GPGGA,000000.00,3700.0000,N,12200.0000,W,1,08,0.9,10.0,M,0.0,M,,*7B"}"#,
        r#"{"channel": "WHEELS", "utime": 30}"#,
    );
    let (tx, rx) = channel();
    let mut app = app(RunOptions::default());
    spawn_line_source(
        "input".to_string(),
        Cursor::new(input),
        app.subscriptions(),
        tx,
    );
    app.start(1, Instant::now()).unwrap();
    app.run(&rx);

    assert_eq!(app.state(), Lifecycle::ShuttingDown);
    assert_eq!(app.publisher().len(), 1);
    assert!(matches!(
        &app.publisher()[0],
        OutboundMessage::GpsToLocal(e) if e.utime == 20 && e.local == [2.0, 0.0, 0.0]
    ));
}

#[test]
fn startup_fails_without_mounting_offset() {
    // the sensor hangs off a live frame, so it cannot be resolved at startup
    let live_mount = config(
        r#"{"coordinate_frames": {
            "body": {"relative_to": "local"},
            "gps18": {"relative_to": "body", "update_channel": "GPS_MOUNT"}
        }}"#,
    );
    match AppContext::initialize(&live_mount, RunOptions::default(), NmeaDecoder, recorder()) {
        Err(StartupError::MountingOffset { source, .. }) => {
            assert_eq!(source, FrameError::NoData("gps18".to_string()))
        },
        Err(e) => panic!("unexpected error {}", e),
        Ok(_) => panic!("startup should fail"),
    }

    let no_sensor = config(r#"{"coordinate_frames": {"body": {"relative_to": "local"}}}"#);
    assert!(matches!(
        AppContext::initialize(&no_sensor, RunOptions::default(), NmeaDecoder, recorder()),
        Err(StartupError::FrameSystem(FrameConfigError::MissingFrame(f))) if f == "gps18"
    ));

    let bad_rate = AppContext::initialize(
        &config(FRAMES),
        RunOptions {
            publish_global_to_local: true,
            global_to_local_hz: 0.0,
        },
        NmeaDecoder,
        recorder(),
    );
    assert!(matches!(bad_rate, Err(StartupError::InvalidRate(_))));
}

#[test]
fn custom_frame_names() {
    let cfg = config(
        r#"{
            "frame_names": {"sensor": "antenna", "body": "base_link", "local": "odom"},
            "root_frame": "odom",
            "coordinate_frames": {
                "base_link": {"relative_to": "odom", "update_channel": "ODOMETRY"},
                "antenna": {"relative_to": "base_link"}
            }
        }"#,
    );
    let mut app =
        AppContext::initialize(&cfg, RunOptions::default(), NmeaDecoder, recorder()).unwrap();
    assert_eq!(app.mounting_offset().sensor_frame(), "antenna");
    assert!(app.subscriptions().poses.contains("ODOMETRY"));

    app.start(1, Instant::now()).unwrap();
    app.handle_event(Event::Pose {
        channel: "ODOMETRY".to_string(),
        pose: PoseMessage {
            utime: 1,
            pos: [4.0, 4.0, 0.0],
            orientation: PoseMessage::IDENTITY_ORIENTATION,
        },
    });
    let estimate = app
        .handle_nmea(&NmeaMessage {
            utime: 2,
            nmea: FIX_37_N_122_W.to_string(),
        })
        .unwrap();
    assert_eq!(estimate.local, [4.0, 4.0, 0.0]);
}
