use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::time::Duration;

use structopt::StructOpt;
use structopt_flags::QuietVerbose;

use tilemap_generator::grid::Size;
use tilemap_generator::GenerationConfig;

fn load_config(s: &str) -> Result<GenerationConfig, String> {
    let path = PathBuf::from(s);
    let file = File::open(path).map_err(|e| format!("Failed to open config file: {}", e))?;
    let reader = BufReader::new(file);
    let config = serde_json::from_reader(reader)
        .map_err(|e| format!("Failed to parse config file: {}", e))?;
    Ok(config)
}

fn parse_millis(s: &str) -> Result<Duration, String> {
    s.parse::<u64>()
        .map(Duration::from_millis)
        .map_err(|_| format!("invalid duration: {}", s))
}

#[derive(Debug)]
pub struct AppConfig {
    pub generation: GenerationConfig,
    pub cancel_after: Option<Duration>,
    pub preview: bool,
}

#[derive(Debug, StructOpt)]
#[structopt(
    name = "Tile Map Generator",
    about = "Generate tile maps with obstacles and resources"
)]
pub struct Opt {
    #[structopt(flatten)]
    pub verbose: QuietVerbose,

    #[structopt(
        parse(try_from_str),
        short,
        long,
        default_value = "10x10",
        help = "Map size in tiles"
    )]
    size: Size,

    #[structopt(
        short,
        long,
        default_value = "0.1",
        help = "Fraction of tiles that become obstacles"
    )]
    obstacles: f64,

    #[structopt(
        short,
        long,
        default_value = "0.02",
        help = "Fraction of tiles that become resources"
    )]
    resources: f64,

    #[structopt(long, help = "Random seed")]
    seed: Option<u64>,

    #[structopt(
        short,
        long,
        parse(try_from_str = load_config),
        help = "JSON generation config; replaces the size and percent flags"
    )]
    config: Option<GenerationConfig>,

    #[structopt(
        long,
        parse(try_from_str = parse_millis),
        help = "Cancel the run after n milliseconds"
    )]
    cancel_after: Option<Duration>,

    #[structopt(short, long, help = "Print the finished map to stdout")]
    preview: bool,
}

impl Opt {
    pub fn to_app_config(self) -> AppConfig {
        let mut generation = self.config.unwrap_or_else(|| {
            GenerationConfig::new(self.size.width, self.size.height, self.obstacles, self.resources)
        });

        if self.seed.is_some() {
            generation.seed = self.seed;
        }

        AppConfig {
            generation,
            cancel_after: self.cancel_after,
            preview: self.preview,
        }
    }
}
