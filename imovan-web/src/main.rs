//! IMOVAN Web Server
//!
//! Marketplace platform server: authentication, role-guarded routes, and
//! the site-map API.

use clap::Parser;
use imovan_web::server::ImovanServer;
use imovan_web::{init_logging, WebConfig};

/// IMOVAN marketplace platform server
#[derive(Parser)]
#[command(name = "imovan-web")]
#[command(about = "Web server for the IMOVAN marketplace platform")]
#[command(version)]
struct Args {
    /// Server host to bind to
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Server port to listen on
    #[arg(short, long, default_value = "8080")]
    port: u16,

    /// Enable development mode (local identity backend with demo accounts)
    #[arg(long)]
    dev: bool,

    /// Hosted identity/data service URL
    #[arg(long)]
    backend_url: Option<String>,

    /// Directory for the durable session tier
    #[arg(long)]
    session_dir: Option<String>,

    /// Platform configuration file (TOML)
    #[arg(long)]
    config: Option<String>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    std::env::set_var(
        "RUST_LOG",
        format!("imovan_web={},imovan_platform={}", args.log_level, args.log_level),
    );
    init_logging();

    // Load environment variables
    dotenvy::dotenv().ok();

    let mut config = WebConfig::from_env();

    // A platform config file overrides environment defaults; CLI flags
    // still win below
    if let Some(path) = &args.config {
        match imovan_core::PlatformConfig::from_file(path) {
            Ok(platform) => config.apply_platform_config(&platform),
            Err(e) => {
                eprintln!("❌ Failed to load config file {}: {}", path, e);
                std::process::exit(1);
            }
        }
    }

    // Command line arguments override the environment
    config.host = args.host;
    config.port = args.port;
    config.dev_mode = args.dev;
    if args.backend_url.is_some() {
        config.backend_url = args.backend_url;
    }
    if let Some(session_dir) = args.session_dir {
        config.session_dir = Some(session_dir.into());
    }

    println!("🚀 Starting IMOVAN web server");
    println!("📍 Server: http://{}:{}", config.host, config.port);

    match &config.backend_url {
        Some(url) => println!("🔐 Identity backend: {}", url),
        None => {
            println!("🔐 Identity backend: local development store");
            println!("   Demo accounts: frotista@imovan.dev / provider@imovan.dev / integrator@imovan.dev");
        }
    }

    let server = match ImovanServer::new(config).await {
        Ok(server) => server,
        Err(e) => {
            eprintln!("❌ Failed to build server: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = server.start().await {
        eprintln!("❌ Server failed to start: {}", e);
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_parsing() {
        use clap::Parser;

        let args = Args::parse_from(["imovan-web"]);
        assert_eq!(args.host, "127.0.0.1");
        assert_eq!(args.port, 8080);
        assert!(!args.dev);

        let args = Args::parse_from([
            "imovan-web",
            "--host",
            "0.0.0.0",
            "--port",
            "3000",
            "--dev",
        ]);
        assert_eq!(args.host, "0.0.0.0");
        assert_eq!(args.port, 3000);
        assert!(args.dev);
    }
}
