use std::{
    fs::File,
    io::{self, BufRead, BufReader, BufWriter, Write},
    process,
    sync::mpsc::channel,
    time::{Duration, Instant},
};

use anyhow::{Context, Result};
use gps_to_local::{
    transport::{spawn_byte_source, spawn_line_source},
    AppContext, Config, Event, JsonLinesPublisher, NmeaDecoder, OutboundMessage, StartupError,
    TransportError,
};
use log::{error, info};

mod cli;
mod logging;

fn main() {
    let args = cli::parse_args();
    logging::initialize(args.verbose);

    if let Err(e) = run(&args) {
        error!("{:#}", e);
        process::exit(1);
    }
}

fn open_output(args: &cli::Args) -> Result<Box<dyn Write>, StartupError> {
    Ok(match &args.output {
        Some(path) => {
            let file = File::create(path).map_err(TransportError::from)?;
            Box::new(BufWriter::new(file))
        },
        None => Box::new(io::stdout()),
    })
}

fn open_input(args: &cli::Args) -> Result<(String, Box<dyn BufRead + Send>), StartupError> {
    Ok(match &args.input {
        Some(path) => {
            let file = File::open(path).map_err(TransportError::from)?;
            (path.display().to_string(), Box::new(BufReader::new(file)))
        },
        None => ("stdin".to_string(), Box::new(BufReader::new(io::stdin()))),
    })
}

fn run(args: &cli::Args) -> Result<()> {
    let config = Config::from_file(&args.frames)?;
    let app = AppContext::initialize(
        &config,
        args.options,
        NmeaDecoder,
        Vec::<OutboundMessage>::new(),
    )?;
    // The output is only created once startup has succeeded
    let publisher = JsonLinesPublisher::new(open_output(args).context("Failed to open output")?);
    let mut app = app.with_publisher(publisher);

    let (name, input) = open_input(args).context("Failed to open input")?;
    let serial = match &args.serial {
        Some(serial) => {
            let port = serialport::new(&serial.port, serial.baud)
                .timeout(Duration::from_millis(100))
                .open()
                .with_context(|| format!("Failed to open port: {}", serial.port))?;
            Some((serial.port.clone(), port))
        },
        None => None,
    };

    let (tx, rx) = channel();
    let shutdown = tx.clone();
    ctrlc::set_handler(move || {
        let _ = shutdown.send(Event::Shutdown);
    })
    .context("Failed to install termination handler")?;

    let subscriptions = app.subscriptions();
    info!(
        "Subscribed to {} and {:?}",
        subscriptions.nmea, subscriptions.poses
    );
    let mut sources = 1;
    spawn_line_source(name, input, subscriptions, tx.clone());
    if let Some((name, port)) = serial {
        spawn_byte_source(name, port, tx.clone());
        sources += 1;
    }
    drop(tx);

    app.start(sources, Instant::now())?;
    app.run(&rx);
    Ok(())
}
