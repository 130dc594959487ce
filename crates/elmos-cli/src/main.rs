mod render;

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use elmos_client::{BuildOptions, Client, ClientConfig, Notification, QemuConsole, QemuRunOptions};
use elmos_common::types::Color;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use render::TerminalSink;

#[derive(Parser, Debug)]
#[command(author, version, about = "ELMOS kernel development client", long_about = None)]
struct Args {
    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Backend address (unix:///path, tcp://host:port or host:port)
    #[arg(long, env = "ELMOS_ADDRESS", default_value = ClientConfig::DEFAULT_ADDRESS)]
    address: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build the kernel
    Build {
        /// Make targets
        targets: Vec<String>,

        /// Parallel jobs (0 lets the server decide)
        #[arg(short, long, default_value_t = 0)]
        jobs: u32,

        #[arg(long, default_value = "x86_64")]
        arch: String,

        #[arg(short, long)]
        verbose: bool,
    },

    /// Check out a kernel version
    Clone { version: String },

    /// Generate a kernel configuration
    Configure {
        #[arg(default_value = "defconfig")]
        config_type: String,
    },

    /// Remove build artifacts
    Clean {
        /// Also remove the configuration
        #[arg(long)]
        deep: bool,
    },

    /// List available kernel versions
    Versions {
        #[arg(short, long, default_value_t = 20)]
        limit: usize,
    },

    /// Boot the built kernel in QEMU. Stdin lines are sent to the guest,
    /// Ctrl+C stops the VM.
    Run {
        #[arg(long)]
        graphical: bool,

        /// Wait for a debugger before booting
        #[arg(long)]
        gdb: bool,

        #[arg(short, long, default_value_t = 256)]
        memory: u32,

        /// Virtual CPUs (0 lets the server decide)
        #[arg(short, long, default_value_t = 2)]
        cpus: u32,

        /// Kernel command line
        #[arg(long, default_value = "")]
        cmdline: String,

        /// Extra QEMU arguments
        #[arg(last = true)]
        extra_args: Vec<String>,
    },

    /// Stop a running QEMU instance
    Stop,

    /// Show the channel state
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let filter = if args.debug {
        "elmos=debug"
    } else {
        "elmos=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = ClientConfig::new(args.address);
    config.validate()?;

    info!("Connecting to {}", config.address);
    let client = Client::connect(&config);
    let mut out = TerminalSink::stdout();

    let ok = match args.command {
        Command::Build {
            targets,
            jobs,
            arch,
            verbose,
        } => {
            let receiver = client.subscribe();
            let task = client.spawn_build(BuildOptions {
                targets,
                jobs,
                arch,
                verbose,
            });
            follow(&mut out, receiver, task).await?
        }
        Command::Clone { version } => {
            let receiver = client.subscribe();
            let task = client.spawn_clone_kernel(version);
            follow(&mut out, receiver, task).await?
        }
        Command::Configure { config_type } => {
            let ok = client.configure(&config_type).await;
            if ok {
                out.line(&format!("Configured with {config_type}"), Color::Green)?;
            }
            ok
        }
        Command::Clean { deep } => client.clean_artifacts(deep).await,
        Command::Versions { limit } => {
            let versions = client.list_versions(limit).await;
            for version in &versions {
                println!("{version}");
            }
            client.last_error().is_none()
        }
        Command::Run {
            graphical,
            gdb,
            memory,
            cpus,
            cmdline,
            extra_args,
        } => {
            let options = QemuRunOptions {
                graphical,
                debug: gdb,
                memory_mb: memory,
                cpus,
                extra_args,
                kernel_cmdline: cmdline,
            };
            run_qemu(&client, options).await?
        }
        Command::Stop => client.qemu_stop().await,
        Command::Status => {
            // Lazy channels only learn their state from a call
            client.list_versions(1).await;
            let reachable = client.is_connected();
            out.line(
                &format!(
                    "{}: {}",
                    config.address,
                    if reachable { "connected" } else { "not connected" }
                ),
                if reachable { Color::Green } else { Color::Red },
            )?;
            reachable
        }
    };

    if ok {
        Ok(())
    } else {
        Err(anyhow!(client
            .last_error()
            .unwrap_or_else(|| "operation failed".to_string())))
    }
}

/// Print notifications until the streaming task finishes.
async fn follow(
    out: &mut TerminalSink<std::io::Stdout>,
    mut receiver: mpsc::UnboundedReceiver<Notification>,
    mut task: JoinHandle<bool>,
) -> Result<bool> {
    loop {
        tokio::select! {
            result = &mut task => {
                while let Ok(notification) = receiver.try_recv() {
                    out.notification(&notification)?;
                }
                return Ok(result?);
            }
            Some(notification) = receiver.recv() => out.notification(&notification)?,
        }
    }
}

async fn run_qemu(client: &Client, options: QemuRunOptions) -> Result<bool> {
    let mut console = QemuConsole::new(TerminalSink::stdout());
    let mut receiver = client.subscribe();
    console.begin();
    let mut task = client.spawn_qemu_run(options);
    let mut input = BufReader::new(tokio::io::stdin()).lines();
    let mut input_open = true;

    loop {
        tokio::select! {
            result = &mut task => {
                while let Ok(notification) = receiver.try_recv() {
                    console.handle(&notification);
                }
                return Ok(result?);
            }
            Some(notification) = receiver.recv() => console.handle(&notification),
            line = input.next_line(), if input_open => match line? {
                Some(line) => {
                    console.submit(client, &line).await;
                }
                None => {
                    debug!("Stdin closed");
                    input_open = false;
                }
            },
            signal = tokio::signal::ctrl_c() => {
                signal?;
                info!("Ctrl+C pressed, stopping QEMU");
                console.stop(client).await;
            }
        }
    }
}
