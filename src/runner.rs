use std::path::PathBuf;

use anyhow::{Context, Result, anyhow, bail};
use camino::{Utf8Path, Utf8PathBuf};

use dskit::ConfigData;
use dskit::common;
use dskit::scaffold::{self, GenerateOptions, Manifest};

use crate::cli::{Cli, Command, InitArgs, ManifestArgs, MkdirArgs, ShowArgs};

pub fn run(cli: Cli) -> Result<()> {
    if let Some(dir) = &cli.chdir {
        std::env::set_current_dir(dir)
            .with_context(|| format!("changing directory to {}", dir.display()))?;
    }

    match cli.command {
        Command::Init(args) => handle_init(args),
        Command::Manifest(args) => handle_manifest(&args),
        Command::Show(args) => handle_show(args),
        Command::Mkdir(args) => handle_mkdir(args),
    }
}

fn handle_init(args: InitArgs) -> Result<()> {
    let manifest = resolve_manifest(&args.manifest)?;
    let root = Utf8Path::new(".");
    let options = GenerateOptions {
        dry_run: args.dry_run,
    };

    let report = scaffold::generate(root, &manifest, options)
        .with_context(|| format!("scaffolding project `{}`", manifest.project_name()))?;

    let prefix = if args.dry_run { "(dry-run) " } else { "" };
    println!(
        "{}Scaffolded `{}`: {} created, {} already present",
        prefix,
        manifest.project_name(),
        report.created(),
        report.skipped()
    );
    Ok(())
}

fn handle_manifest(args: &ManifestArgs) -> Result<()> {
    let manifest = resolve_manifest(args)?;
    for entry in manifest.entries() {
        println!("{}", entry);
    }
    Ok(())
}

fn handle_show(args: ShowArgs) -> Result<()> {
    let path = utf8(args.file)?;
    let config = load_config(&path)?;

    let rendered = match args.key.as_deref() {
        Some(key) => {
            let value = config
                .lookup(key)
                .ok_or_else(|| anyhow!("key `{}` not found in {}", key, path))?;
            serde_json::to_string_pretty(value)?
        }
        None => serde_json::to_string_pretty(&config)?,
    };
    println!("{}", rendered);
    Ok(())
}

fn handle_mkdir(args: MkdirArgs) -> Result<()> {
    let paths = args
        .paths
        .into_iter()
        .map(utf8)
        .collect::<Result<Vec<_>>>()?;
    common::create_directories(&paths, !args.quiet).context("creating directories")
}

fn resolve_manifest(args: &ManifestArgs) -> Result<Manifest> {
    match &args.manifest {
        Some(path) => {
            let path = utf8(path.clone())?;
            Manifest::load(&path, args.project.as_deref())
                .with_context(|| format!("loading manifest {}", path))
        }
        None => Manifest::datascience(args.project_name()).context("rendering default manifest"),
    }
}

fn load_config(path: &Utf8Path) -> Result<ConfigData> {
    match path.extension() {
        Some("yaml" | "yml") => {
            common::read_yaml(path).with_context(|| format!("reading {}", path))
        }
        Some("json") => common::load_json(path).with_context(|| format!("reading {}", path)),
        _ => bail!("{} is not a .yaml, .yml or .json file", path),
    }
}

fn utf8(path: PathBuf) -> Result<Utf8PathBuf> {
    Utf8PathBuf::from_path_buf(path).map_err(|p| anyhow!("path {} is not valid UTF-8", p.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    use tempfile::TempDir;

    fn scratch() -> (TempDir, Utf8PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        (dir, root)
    }

    #[test]
    fn load_config_dispatches_on_extension() {
        let (_guard, root) = scratch();
        fs::write(root.join("params.yml"), "alpha: 0.2\n").unwrap();
        fs::write(root.join("metrics.json"), "{\"rmse\": 1.0}").unwrap();
        fs::write(root.join("notes.txt"), "hi").unwrap();

        assert!(load_config(&root.join("params.yml")).unwrap().contains_key("alpha"));
        assert!(load_config(&root.join("metrics.json")).unwrap().contains_key("rmse"));
        assert!(load_config(&root.join("notes.txt")).is_err());
    }

    #[test]
    fn resolve_manifest_prefers_user_file() {
        let (_guard, root) = scratch();
        let path = root.join("layout.toml");
        fs::write(&path, "files = [\"src/{project_name}/app.py\"]\n").unwrap();

        let args = ManifestArgs {
            project: Some("etl".to_owned()),
            manifest: Some(path.into_std_path_buf()),
        };
        let manifest = resolve_manifest(&args).unwrap();
        assert_eq!(manifest.entries(), ["src/etl/app.py"]);

        let args = ManifestArgs {
            project: None,
            manifest: None,
        };
        let manifest = resolve_manifest(&args).unwrap();
        assert_eq!(manifest.project_name(), "datascience");
    }

    #[test]
    fn mkdir_creates_all_paths() {
        let (_guard, root) = scratch();
        let args = MkdirArgs {
            paths: vec![
                root.join("artifacts/models").into_std_path_buf(),
                root.join("logs").into_std_path_buf(),
            ],
            quiet: true,
        };
        handle_mkdir(args).unwrap();
        assert!(root.join("artifacts/models").is_dir());
        assert!(root.join("logs").is_dir());
    }
}
