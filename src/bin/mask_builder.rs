use std::path::PathBuf;

use anyhow::Context;
use glam::DVec2;
use log::{info, warn};
use moircs_mask::{
    canvas::MemoryCanvas,
    grism::GrismTable,
    settings::{Settings, SettingsStore},
    MaskSession,
};
use structopt::StructOpt;

#[derive(Debug, StructOpt)]
#[structopt(name = "mask-builder", about = "MOIRCS slit mask builder")]
struct Opt {
    /// Path to the `.mdp` mask design file
    mdp: PathBuf,
    /// Grism used for the spectra footprints
    #[structopt(short, long)]
    grism: Option<String>,
    /// JSON grism table replacing the built-in one
    #[structopt(long)]
    grism_table: Option<PathBuf>,
    /// FOV centre x in pixels
    #[structopt(long)]
    fov_x: Option<f64>,
    /// FOV centre y in pixels
    #[structopt(long)]
    fov_y: Option<f64>,
    /// Exclude shapes whose spectra overlap
    #[structopt(short, long)]
    auto_detect: bool,
    /// Print the shape list
    #[structopt(short, long)]
    list: bool,
    /// Write the mask back as `.mdp`
    #[structopt(long)]
    mdp_out: Option<PathBuf>,
    /// Write the laser cutter `.sbr` file
    #[structopt(long)]
    sbr_out: Option<PathBuf>,
    /// Focal-plane centre `x,y` in pixels for the `.sbr` file [default: FOV centre]
    #[structopt(long, parse(try_from_str = parse_point))]
    sbr_center: Option<DVec2>,
    /// Image name recorded in the `.sbr` header
    #[structopt(long)]
    image: Option<String>,
    /// Save the settings used for this run
    #[structopt(long)]
    save_settings: bool,
}

fn parse_point(src: &str) -> anyhow::Result<DVec2> {
    let (x, y) = src
        .split_once(',')
        .with_context(|| format!("expected x,y, got {src:?}"))?;
    Ok(DVec2::new(x.trim().parse()?, y.trim().parse()?))
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let opt = Opt::from_args();

    let store = SettingsStore::new()?;
    let mut settings: Settings = store.load();
    if let Some(grism) = &opt.grism {
        settings.grism = grism.clone();
    }
    if let Some(x) = opt.fov_x {
        settings.fov_center[0] = x;
    }
    if let Some(y) = opt.fov_y {
        settings.fov_center[1] = y;
    }

    let grisms = match &opt.grism_table {
        Some(path) => GrismTable::from_json_file(path)
            .with_context(|| format!("reading grism table {}", path.display()))?,
        None => GrismTable::default(),
    };

    let mut session = MaskSession::with_grisms(MemoryCanvas::new(), &settings, grisms);
    session.start();
    if let Some(image) = &opt.image {
        session.set_image(image.clone(), 0, 0);
    }
    let n = session
        .load_mdp(&opt.mdp)
        .with_context(|| format!("loading {}", opt.mdp.display()))?;
    info!("{n} shapes, FOV centre {:?}", session.fov_center());

    if opt.auto_detect {
        let excluded = session.auto_detect_overlaps();
        println!("Excluded {excluded} overlapping shape(s).");
    }
    if opt.list {
        for line in session.shape_list() {
            println!("{line}");
        }
    }
    if let Some(path) = &opt.mdp_out {
        session.save_mdp(path)?;
        info!("Wrote {}", path.display());
    }
    if let Some(path) = &opt.sbr_out {
        let center = opt.sbr_center.unwrap_or_else(|| session.fov_center());
        let report = session.save_sbr(path, center)?;
        for skipped in &report.skipped {
            warn!("shape {}: {}", skipped.index, skipped.reason);
        }
        info!("Wrote {} cuts to {}", report.written, path.display());
    }
    if opt.save_settings {
        let path = store.save(&settings)?;
        info!("Settings saved to {}", path.display());
    }
    session.stop();

    Ok(())
}
