use std::time::Duration;

use netprobe::{traceroute_stream, StopCondition, SystemResolver, TracerouteConfig};

type GenericError = Box<dyn std::error::Error + Send + Sync + 'static>;

const INTERRUPTED_EXIT_CODE: i32 = 130;

#[derive(argh::FromArgs)]
/// nettraceroute - print the route ICMP packets take to a host
struct Args {
    #[argh(option, short = 'm', default = "netprobe::DEFAULT_MAX_HOPS")]
    /// maximum number of hops to probe
    max_hops: u8,

    #[argh(option, short = 'q', default = "netprobe::DEFAULT_PROBES_PER_HOP")]
    /// probes sent per hop
    probes: u16,

    #[argh(option, short = 't', default = "netprobe::DEFAULT_TRACEROUTE_TIMEOUT.as_secs_f64()")]
    /// seconds to wait for each probe
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

    let config = TracerouteConfig {
        max_hops: args.max_hops,
        probes: args.probes,
        timeout: Duration::try_from_secs_f64(args.timeout)?,
        stop: stop.clone(),
        ..TracerouteConfig::default()
    };

    let status = traceroute_stream(&args.host, &config, &SystemResolver, |line| println!("{line}"));
    if stop.should_stop() {
        println!("--- traceroute interrupted ---");
        std::process::exit(INTERRUPTED_EXIT_CODE);
    }
    std::process::exit(status.code());
}
