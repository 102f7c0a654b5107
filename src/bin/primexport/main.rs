//! primexport CLI - run export jobs against a JSON scene file.
//!
//! The scene file carries the objects, the selection and the answers the
//! remote side should give; a [`ReplayRemote`] plays them back with a
//! configurable latency so a job runs exactly as it would inside a host.

use primexport::export::TextureFormat;
use primexport::hpa::read_snapshot;
use primexport::prelude::*;
use primexport::scene::PCODE_AVATAR;
use primexport::shape::ShapeBlock;

use anyhow::{bail, Context};
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

/// Host tick interval.
const TICK: Duration = Duration::from_millis(10);

/// Ticks spent collecting texture and asset replies after the document is written.
const SETTLE_TICKS: u32 = 200;

fn main() {
    let args: Vec<String> = env::args().collect();

    // Parse global flags
    let mut level = "info";
    let mut filtered_args: Vec<&str> = Vec::new();
    for arg in &args[1..] {
        match arg.as_str() {
            "-v" | "--verbose" => level = "debug",
            "-vv" | "--trace" => level = "trace",
            "-q" | "--quiet" => level = "warn",
            _ => filtered_args.push(arg),
        }
    }
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_target(false)
        .init();

    if filtered_args.is_empty() {
        print_help();
        return;
    }

    let result = match filtered_args[0] {
        "e" | "export" => cmd_export(&filtered_args[1..]),
        "s" | "shapes" => match filtered_args.get(1) {
            Some(path) => cmd_shapes(path),
            None => usage("primexport shapes <scene.json>"),
        },
        "snap" | "snapshot" => match filtered_args.get(1) {
            Some(path) => cmd_snapshot(path),
            None => usage("primexport snapshot <file.json[.gz]>"),
        },
        "settings" => cmd_settings(&filtered_args[1..]),
        "h" | "help" | "-h" | "--help" => {
            print_help();
            Ok(())
        }
        // A bare scene file is an export with default options
        path if path.ends_with(".json") => cmd_export(&filtered_args),
        other => {
            eprintln!("Error: unknown command '{}'", other);
            print_help();
            std::process::exit(1);
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn usage(text: &str) -> anyhow::Result<()> {
    bail!("missing file argument\nUsage: {}", text)
}

fn print_help() {
    println!("primexport - linkset export toolkit");
    println!();
    println!("USAGE:");
    println!("    primexport [OPTIONS] <COMMAND> [ARGS]");
    println!();
    println!("COMMANDS:");
    println!("    e, export   <scene.json> [opts]  Export the scene's selection to an XML document");
    println!("    s, shapes   <scene.json>         Show the shape every object classifies as");
    println!("    snap, snapshot <file>            Summarize a JSON snapshot (plain or gzipped)");
    println!("    settings    [--save]             Show (or write back) the stored settings");
    println!("    h, help                          Show this help");
    println!();
    println!("EXPORT OPTIONS:");
    println!("    -o, --output <file>      Document path (default: <scene>.xml)");
    println!("    --settings <file>        Read settings from a JSON file");
    println!("    --no-properties          Skip property queries (implies --no-inventory)");
    println!("    --no-inventory           Skip inventory queries");
    println!("    --textures <list>        Texture formats: tga,png or none");
    println!("    --ignore-permissions     Export objects the agent could not modify");
    println!("    --snapshot               Also write a JSON snapshot next to the document");
    println!("    --gzip                   Gzip the snapshot");
    println!("    --timeout <secs>         Seconds before an unanswered query is re-sent");
    println!("    --retries <n>            Re-sends before a query is given up (0 = never)");
    println!("    --latency <ticks>        Simulated reply latency (default 1)");
    println!("    --drop <n>               Ignore the first n property requests per object");
    println!();
    println!("OPTIONS:");
    println!("    -v, --verbose    Show debug output");
    println!("    -vv, --trace     Show trace output (very verbose)");
    println!("    -q, --quiet      Only warnings and errors");
    println!();
    println!("EXAMPLES:");
    println!("    primexport export house.json -o out/house.xml");
    println!("    primexport export house.json --textures png --snapshot --gzip");
    println!("    primexport shapes house.json");
    println!("    primexport snapshot out/house.json.gz");
    println!();
    println!("NOTES:");
    println!("    - Passing a .json scene directly is equivalent to 'export'");
    println!("    - RUST_LOG overrides the verbosity flags");
}

/// Options for one export run.
struct ExportArgs {
    scene: PathBuf,
    output: Option<PathBuf>,
    settings: ExportSettings,
    latency: u64,
    drop_first: u32,
}

fn next_value<'a>(it: &mut std::slice::Iter<'_, &'a str>, flag: &str) -> anyhow::Result<&'a str> {
    it.next().copied().with_context(|| format!("{} needs a value", flag))
}

fn parse_export_args(args: &[&str]) -> anyhow::Result<ExportArgs> {
    // Settings file first so explicit flags win over it
    let mut settings = match args.iter().position(|a| *a == "--settings") {
        Some(i) => {
            let path = args.get(i + 1).context("--settings needs a value")?;
            ExportSettings::from_file(path).with_context(|| format!("reading settings {}", path))?
        }
        None => ExportSettings::load(),
    };

    let mut scene = None;
    let mut output = None;
    let mut latency = 1;
    let mut drop_first = 0;
    let mut it = args.iter();
    while let Some(arg) = it.next() {
        match *arg {
            "-o" | "--output" => output = Some(PathBuf::from(next_value(&mut it, arg)?)),
            "--settings" => {
                next_value(&mut it, arg)?;
            }
            "--no-properties" => settings.export_properties = false,
            "--no-inventory" => settings.export_inventory = false,
            "--textures" => settings.texture_formats = TextureFormat::parse_list(next_value(&mut it, arg)?)?,
            "--ignore-permissions" => settings.follow_permissions = false,
            "--snapshot" => settings.write_snapshot = true,
            "--gzip" => {
                settings.write_snapshot = true;
                settings.compress_snapshot = true;
            }
            "--timeout" => settings.query_timeout_secs = next_value(&mut it, arg)?.parse()?,
            "--retries" => settings.max_retries = next_value(&mut it, arg)?.parse()?,
            "--latency" => latency = next_value(&mut it, arg)?.parse()?,
            "--drop" => drop_first = next_value(&mut it, arg)?.parse()?,
            flag if flag.starts_with('-') => bail!("unknown option '{}'", flag),
            path => {
                if scene.replace(PathBuf::from(path)).is_some() {
                    bail!("more than one scene file given");
                }
            }
        }
    }

    let Some(scene) = scene else {
        bail!("missing scene file\nUsage: primexport export <scene.json> [-o out.xml]");
    };
    Ok(ExportArgs { scene, output, settings: settings.validate(), latency, drop_first })
}

fn cmd_export(args: &[&str]) -> anyhow::Result<()> {
    let args = parse_export_args(args)?;
    let output = args.output.unwrap_or_else(|| args.scene.with_extension("xml"));
    info!("Loading scene: {}", args.scene.display());

    let file = Arc::new(
        SceneFile::load(&args.scene).with_context(|| format!("loading {}", args.scene.display()))?,
    );
    let mut scene = file.scene();
    let selection = file.effective_selection(&scene);
    if selection.is_empty() {
        bail!("nothing to export: the scene has no root objects");
    }
    if let Some(dir) = output.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    }

    let mut job = ExportJob::new(args.settings.clone());
    let mut remote = ReplayRemote::new(Arc::clone(&file), job.reply_sender())
        .with_latency(args.latency)
        .dropping_first(args.drop_first);
    let fs = LocalFs;

    let request = ExportRequest::new(selection, output.clone())
        .agent(file.agent_id)
        .environment(file.environment.clone());
    job.start(request, args.settings, &mut scene);

    let started = Instant::now();
    let mut ticks = 0u64;
    let outcome = loop {
        let state = {
            let mut host = HostContext::new(&mut scene, &mut remote, &fs);
            job.tick(Instant::now(), &mut host)
        };
        ticks += 1;
        match state {
            Ok(state) if state.is_running() => {}
            other => break other,
        }
        remote.pump();
        std::thread::sleep(TICK);
    };
    debug!("job settled after {} ticks in {:.2?}", ticks, started.elapsed());

    // Textures and inventory assets are not waited on before the document
    // is written; give the ones still in flight a chance to land.
    let mut settle = 0;
    while remote.queued() > 0 && settle < SETTLE_TICKS {
        remote.pump();
        let mut host = HostContext::new(&mut scene, &mut remote, &fs);
        if let Err(e) = job.tick(Instant::now(), &mut host) {
            warn!("{}", e);
        }
        settle += 1;
    }

    println!("{}", job.progress().status_text());
    for issue in &job.progress().issues {
        println!("  - {}", issue);
    }
    let stats = remote.stats();
    debug!(
        "remote: {} properties, {} inventory, {} asset requests, {} texture fetches, {} dropped",
        stats.properties_requests,
        stats.inventory_requests,
        stats.asset_requests,
        stats.texture_fetches,
        stats.dropped
    );

    match outcome {
        Ok(JobState::Finalized) => {
            println!("Wrote {}", output.display());
            Ok(())
        }
        Ok(state) => bail!("export ended in state '{}'", state),
        Err(e) => Err(e.into()),
    }
}

fn cmd_shapes(path: &str) -> anyhow::Result<()> {
    let file = SceneFile::load(path).with_context(|| format!("loading {}", path))?;
    let mut objects: Vec<&SceneObject> = file.objects.iter().collect();
    objects.sort_by_key(|o| o.local_id);

    println!("{:>8}  {:<36}  {:<10}  {}", "LOCAL", "ID", "SHAPE", "DETAIL");
    for obj in objects {
        if obj.is_avatar || obj.pcode == PCODE_AVATAR {
            println!("{:>8}  {:<36}  {:<10}", obj.local_id, obj.id, "avatar");
            continue;
        }
        let shape = classify_object(obj);
        let detail = match shape {
            PrimShape::Volume(kind) => describe_block(&ShapeBlock::derive(kind, &obj.volume)),
            PrimShape::Sculpt => obj
                .sculpt
                .map(|s| format!("map {} type {}", s.texture, s.sculpt_type))
                .unwrap_or_default(),
            PrimShape::Tree { species } | PrimShape::Grass { species } => format!("species {}", species),
        };
        println!("{:>8}  {:<36}  {:<10}  {}", obj.local_id, obj.id, shape.tag(), detail);
    }
    Ok(())
}

fn describe_block(block: &ShapeBlock) -> String {
    let mut parts = vec![format!("cut {:.2}..{:.2}", block.path_cut.0, block.path_cut.1)];
    if let Some(hollow) = &block.hollow {
        parts.push(format!("hollow {:.0}% {:?}", hollow.amount, hollow.shape));
    }
    if block.twist.0 != 0.0 || block.twist.1 != 0.0 {
        parts.push(format!("twist {:.2}..{:.2}", block.twist.0, block.twist.1));
    }
    if let Some(circular) = &block.circular {
        parts.push(format!("revolutions {:.2}", circular.revolutions));
    }
    parts.join(", ")
}

fn cmd_snapshot(path: &str) -> anyhow::Result<()> {
    let bytes = std::fs::read(Path::new(path)).with_context(|| format!("reading {}", path))?;
    let snapshot = read_snapshot(&bytes)?;
    let doc = &snapshot.document;

    println!("Snapshot v{}: {}", snapshot.version, snapshot.name);
    println!("  date:     {}", snapshot.date);
    println!("  software: {}", snapshot.software);
    println!("  grid:     {}", snapshot.grid);
    println!("  linksets: {}", doc.linksets().len());
    println!("  prims:    {}", doc.node_count());
    let with_props = doc.nodes().filter(|n| n.metadata.is_some()).count();
    let items: usize = doc.nodes().filter_map(|n| n.inventory.as_ref()).map(Vec::len).sum();
    println!("  with properties: {}", with_props);
    println!("  inventory items: {}", items);
    Ok(())
}

fn cmd_settings(args: &[&str]) -> anyhow::Result<()> {
    let settings = ExportSettings::load();
    println!("{}", serde_json::to_string_pretty(&settings)?);
    if args.contains(&"--save") {
        settings.save();
        info!("settings saved");
    }
    Ok(())
}
