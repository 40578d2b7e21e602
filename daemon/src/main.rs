// Copyright 2026 bgpcore Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use bgpcore::config::Config;
use bgpcore::log::LogLevel;
use bgpcore::server::BgpServer;
use bgpcore::{error, info};
use clap::Parser;

#[derive(Parser)]
#[command(name = "bgpcored")]
#[command(about = "BGP peer-session daemon", version)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.yaml")]
    config: String,

    /// Log level: error, warn, info, debug
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let level: LogLevel = args.log_level.parse()?;
    bgpcore::log::set_level(level);

    let config = Config::from_file(&args.config).unwrap_or_else(|e| {
        error!("failed to load config", "path" => &args.config, "error" => e.to_string());
        info!("using default configuration");
        Config::default()
    });

    info!("starting BGP daemon",
        "listen_addr" => &config.listen_addr,
        "asn" => config.asn,
        "router_id" => config.router_id.to_string(),
        "peers" => config.peers.len()
    );

    let mut server = BgpServer::new(config)?;
    server.listen().await?;
    server.serve().await?;

    Ok(())
}
