use std::time::Duration;

use netprobe::{ping_stream, PingConfig, StopCondition, SystemResolver};

type GenericError = Box<dyn std::error::Error + Send + Sync + 'static>;

const INTERRUPTED_EXIT_CODE: i32 = 130;

#[derive(argh::FromArgs)]
/// netping - send ICMP ECHO_REQUEST to a host
struct Args {
    #[argh(option, short = 'c', default = "netprobe::DEFAULT_PING_COUNT")]
    /// stop after <count> echo requests
    count: u16,

    #[argh(option, short = 't', default = "netprobe::DEFAULT_PING_TIMEOUT.as_secs_f64()")]
    /// seconds to wait for each reply
    timeout: f64,

    #[argh(switch, short = 'v')]
    /// log probe details to stderr
    verbose: bool,

    #[argh(positional)]
    /// host name or IPv4 address
    host: String,
}

fn main() -> Result<(), GenericError> {
    let args: Args = argh::from_env();

    let subscriber = tracing_subscriber::FmtSubscriber::builder()
        .with_max_level(if args.verbose { tracing::Level::TRACE } else { tracing::Level::WARN })
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let stop = StopCondition::new();
    let handler_stop = stop.clone();
    ctrlc::set_handler(move || handler_stop.set_should_stop())?;

    let config = PingConfig {
        count: args.count,
        timeout: Duration::try_from_secs_f64(args.timeout)?,
        stop: stop.clone(),
        ..PingConfig::default()
    };
    tracing::trace!("count == {}, timeout == {:?}", config.count, config.timeout);

    let status = ping_stream(&args.host, &config, &SystemResolver, |line| println!("{line}"));
    if stop.should_stop() {
        println!("--- ping interrupted ---");
        std::process::exit(INTERRUPTED_EXIT_CODE);
    }
    std::process::exit(status.code());
}
