use cargo_gauntlet::color_eyre;
use cargo_gauntlet::{run, Args, Config};

fn main() -> color_eyre::eyre::Result<()> {
    color_eyre::install()?;
    let args = Args::parse()?;
    let mut config = Config::from_env()?;
    config.with_args(&args);
    run(config)
}
