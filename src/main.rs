mod app;
mod cli;

use simplelog::{ColorChoice, Config, TermLogger, TerminalMode};
use structopt::StructOpt;
use structopt_flags::LogLevel;

use app::TileMapApp;
use cli::Opt;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let opt: Opt = Opt::from_args();

    TermLogger::init(
        opt.verbose.get_level_filter(),
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )?;

    let config = opt.to_app_config();

    TileMapApp::new(config).run().map_err(|err| {
        log::error!("{}", err);
        err
    })?;

    Ok(())
}
