// ABOUTME: Command line tool sending one SMS through a GSM modem attached to a serial port
// ABOUTME: Parses operator flags with argh, sets up tracing output and reports the send outcome

use argh::FromArgs;
use atsms::{ModemSession, SerialProfile, SmsMessage, SmsTransmitter};
use std::error::Error;
use tracing::{Level, debug, error, info};
use tracing_subscriber::FmtSubscriber;

/// Send an SMS through a GSM modem in PDU mode
#[derive(FromArgs)]
struct CliArgs {
    /// whether or not to enable debugging
    #[argh(switch, short = 'd')]
    debug: bool,

    /// telephone number
    #[argh(option, short = 't')]
    tel: Option<String>,

    /// sms text
    #[argh(option)]
    sms: Option<String>,

    /// serial port name (default: COM1 on Windows, /dev/ttyUSB0 elsewhere)
    #[argh(option)]
    port: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let cli_args: CliArgs = argh::from_env();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(if cli_args.debug { Level::DEBUG } else { Level::INFO })
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let (Some(tel), Some(sms)) = (cli_args.tel, cli_args.sms) else {
        println!("telephone and sms text is required");
        println!("Run with --help for usage information.");
        return Ok(());
    };
    if tel.is_empty() || sms.is_empty() {
        println!("telephone and sms text is required");
        return Ok(());
    }

    let port = cli_args
        .port
        .unwrap_or_else(|| SerialProfile::default_port().to_owned());

    info!("Sending SMS to {tel} via {port}");

    let mut session = ModemSession::serial(&port);
    debug!(config = ?session.config(), "Session configuration");
    if let Err(e) = session.send_sms(&SmsMessage::new(tel, sms)).await {
        error!("{e}");
        return Err(e.into());
    }

    println!("Message sent successfully");
    Ok(())
}
