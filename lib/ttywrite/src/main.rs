mod image;
mod parsers;
mod protocol;

use std::fs::File;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::process;
use std::time::Duration;

use raspboot::layout::MemoryLayout;
use serial::core::{BaudRate, CharSize, FlowControl, SerialDevice, StopBits};
use serial::{PortSettings, SerialPort};
use structopt::StructOpt;

use parsers::{parse_baud_rate, parse_flow_control, parse_stop_bits, parse_width};

#[derive(StructOpt, Debug)]
#[structopt(about = "Send a kernel to a Raspberry Pi waiting in raspboot.")]
struct Opt {
    #[structopt(short = "i", parse(from_os_str),
    help = "Kernel image (defaults to stdin if not set)")]
    input: Option<PathBuf>,

    #[structopt(short = "b", long = "baud", parse(try_from_str = "parse_baud_rate"),
    help = "Set baud rate", default_value = "115200")]
    baud_rate: BaudRate,

    #[structopt(short = "t", long = "timeout", parse(try_from_str),
    help = "Set timeout in seconds", default_value = "10")]
    timeout: u64,

    #[structopt(short = "w", long = "width", parse(try_from_str = "parse_width"),
    help = "Set data character width in bits", default_value = "8")]
    char_width: CharSize,

    #[structopt(help = "Path to TTY device", parse(from_os_str))]
    tty_path: PathBuf,

    #[structopt(short = "f", long = "flow-control", parse(try_from_str = "parse_flow_control"),
    help = "Enable flow control ('hardware' or 'software')", default_value = "none")]
    flow_control: FlowControl,

    #[structopt(short = "s", long = "stop-bits", parse(try_from_str = "parse_stop_bits"),
    help = "Set number of stop bits", default_value = "1")]
    stop_bits: StopBits,

    #[structopt(short = "r", long = "raw", help = "Input is already zlib compressed")]
    raw: bool,

    #[structopt(short = "a", long = "attempts", parse(try_from_str),
    help = "Give up after this many rejected size declarations", default_value = "3")]
    attempts: usize,

    #[structopt(short = "m", long = "monitor",
    help = "Keep printing the board's console after sending")]
    monitor: bool,
}

fn read_input(opt: &Opt) -> io::Result<Vec<u8>> {
    let mut kernel = Vec::new();
    match &opt.input {
        Some(path) => File::open(path)?.read_to_end(&mut kernel)?,
        None => io::stdin().read_to_end(&mut kernel)?,
    };
    Ok(kernel)
}

fn run(opt: &Opt) -> io::Result<()> {
    let kernel = read_input(opt)?;
    // a raw image's inflated size is unknown here
    let kernel_len = if opt.raw { 0 } else { kernel.len() };
    let image = if opt.raw { kernel } else { image::compress(&kernel)? };

    for warning in image::size_warnings(&MemoryLayout::RASPBERRY_PI, kernel_len, image.len()) {
        println!("warning: {}", warning);
    }

    let mut port = serial::open(&opt.tty_path)?;
    port.configure(&PortSettings {
        baud_rate: opt.baud_rate,
        char_size: opt.char_width,
        parity: serial::ParityNone,
        stop_bits: opt.stop_bits,
        flow_control: opt.flow_control,
    })?;
    SerialDevice::set_timeout(&mut port, Duration::from_secs(opt.timeout))?;

    println!("Waiting for the loader on {}...", opt.tty_path.display());
    let stdout = io::stdout();
    let mut echo = stdout.lock();

    protocol::send_image(&mut port, &mut echo, &image, opt.attempts, |sent| {
        print!(".");
        if sent == image.len() {
            println!();
        }
        io::stdout().flush().ok();
    })?;
    println!("Sent {} bytes", image.len());

    if opt.monitor {
        protocol::monitor(&mut port, &mut echo)?;
    }
    Ok(())
}

fn main() {
    let opt = Opt::from_args();

    if let Err(e) = run(&opt) {
        eprintln!("Failed to send: {}", e);
        process::exit(1);
    }
}
