//! dockdash - Docker 部署看板控制台客户端
//!
//! Usage:
//! - Default server: `dockdash`
//! - Custom server: `dockdash --server http://dashboard.internal:8080`
//! - Verbose log tab: `dockdash --level 4`

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use dockdash::RuntimeConfig;

/// 解析命令行参数
fn parse_args() -> RuntimeConfig {
    let args: Vec<String> = std::env::args().collect();
    let mut config = RuntimeConfig::default();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--server" if i + 1 < args.len() => {
                config.server_override = Some(args[i + 1].clone());
                i += 2;
            }
            "--level" if i + 1 < args.len() => {
                config.level_override = args[i + 1].parse().ok();
                i += 2;
            }
            "--help" | "-h" => {
                print_help();
                std::process::exit(0);
            }
            _ => {
                i += 1;
            }
        }
    }

    config
}

fn print_help() {
    println!("dockdash - Docker 部署看板控制台客户端");
    println!();
    println!("USAGE:");
    println!("    dockdash [OPTIONS]");
    println!();
    println!("OPTIONS:");
    println!("    --server <URL>   Dashboard server base URL");
    println!("    --level <0-4>    Minimum log level shown (0=critical, 4=debug)");
    println!("    -h, --help       Print help information");
    println!();
    println!("EXAMPLES:");
    println!("    dockdash                                       # localhost dashboard");
    println!("    dockdash --server https://ships.example.com    # remote dashboard");
    println!("    dockdash --level 4                             # show debug log entries");
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();
}

fn main() {
    let config = parse_args();
    init_tracing();

    let rt = tokio::runtime::Runtime::new().expect("Failed to create runtime");
    rt.block_on(async {
        dockdash::init_and_run_console(config).await;
    });
}
