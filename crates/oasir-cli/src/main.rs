mod inspect;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use clap_complete::Shell;

use oasir_core::Renderer;
use oasir_core::config::{self, CONFIG_FILE_NAME, OasirConfig};
use oasir_core::ir::IrSpec;
use oasir_core::parse::{self, spec::OpenApiSpec};
use oasir_core::transform::{self, TransformOptions};

use inspect::{InspectFormat, InspectRenderer};

#[derive(Parser)]
#[command(name = "oasir", about = "OpenAPI 3.x to SDK intermediate representation", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse and transform an OpenAPI document, reporting diagnostics
    Validate {
        /// Path to the OpenAPI document (YAML or JSON); defaults to `input` from the config
        #[arg(short, long)]
        input: Option<PathBuf>,
    },

    /// Print a summary of the IR built from an OpenAPI document
    Inspect {
        /// Path to the OpenAPI document (YAML or JSON); defaults to `input` from the config
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Output format
        #[arg(long, value_enum, default_value_t = InspectFormat::Yaml)]
        format: InspectFormat,
    },

    /// Write a default .oasir.yaml
    Init {
        /// Overwrite an existing config
        #[arg(long)]
        force: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let project = Path::new(".");

    match cli.command {
        Commands::Validate { input } => cmd_validate(project, input),

        Commands::Inspect { input, format } => cmd_inspect(project, input, format),

        Commands::Init { force } => cmd_init(project, force),

        Commands::Completions { shell } => {
            let mut cmd = <Cli as clap::CommandFactory>::command();
            clap_complete::generate(shell, &mut cmd, "oasir", &mut std::io::stdout());
            Ok(())
        }
    }
}

/// The project config in `dir`, or defaults when there is none.
fn project_config(dir: &Path) -> Result<OasirConfig> {
    let path = dir.join(CONFIG_FILE_NAME);
    match config::load_config(&path)? {
        Some(config) => {
            log::debug!("loaded {}", path.display());
            Ok(config)
        }
        None => Ok(OasirConfig::default()),
    }
}

fn input_path(dir: &Path, input: Option<PathBuf>, config: &OasirConfig) -> PathBuf {
    input.unwrap_or_else(|| dir.join(&config.input))
}

/// Parse by extension: `.json` as JSON, anything else as YAML.
fn read_document(path: &Path) -> Result<OpenApiSpec> {
    let content =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;

    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("yaml");

    let parsed = match ext {
        "json" => parse::from_json(&content),
        _ => parse::from_yaml(&content),
    };
    parsed.with_context(|| format!("failed to parse {}", path.display()))
}

fn build_ir(doc: OpenApiSpec, config: &OasirConfig) -> Result<IrSpec> {
    let options = TransformOptions::from(config);
    let ir = transform::transform_with_options(doc, &options)?;
    Ok(ir)
}

fn cmd_validate(dir: &Path, input: Option<PathBuf>) -> Result<()> {
    let config = project_config(dir)?;
    let path = input_path(dir, input, &config);
    let doc = read_document(&path)?;

    eprintln!("Valid OpenAPI {} document: {}", doc.openapi, doc.info.title);
    eprintln!("  Version: {}", doc.info.version);
    eprintln!("  Paths: {}", doc.paths.len());

    if let Some(components) = &doc.components {
        eprintln!("  Schemas: {}", components.schemas.len());
    }

    let ir = build_ir(doc, &config)
        .with_context(|| format!("failed to build IR for {}", path.display()))?;
    eprintln!("  Operations: {}", ir.operations().len());
    eprintln!(
        "  Registry: {} schemas ({} synthesized)",
        ir.registry().len(),
        ir.registry().synthesized_names().count()
    );
    for diagnostic in ir.diagnostics() {
        eprintln!("  warning: {diagnostic}");
    }

    eprintln!("Validation successful.");
    Ok(())
}

fn cmd_inspect(dir: &Path, input: Option<PathBuf>, format: InspectFormat) -> Result<()> {
    let config = project_config(dir)?;
    let path = input_path(dir, input, &config);
    let ir = build_ir(read_document(&path)?, &config)
        .with_context(|| format!("failed to build IR for {}", path.display()))?;

    for file in (InspectRenderer { format }).render(&ir)? {
        print!("{}", file.content);
    }
    Ok(())
}

fn cmd_init(dir: &Path, force: bool) -> Result<()> {
    let config_path = dir.join(CONFIG_FILE_NAME);

    if config_path.exists() && !force {
        anyhow::bail!(
            "{} already exists. Use --force to overwrite.",
            config_path.display()
        );
    }

    fs::write(&config_path, config::default_config_content())
        .with_context(|| format!("failed to write {}", config_path.display()))?;
    eprintln!("Created {}", config_path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use oasir_core::config::NamingStrategy;

    const TINY: &str = r#"
openapi: "3.0.3"
info: { title: Tiny, version: "1" }
paths:
  /pets:
    get:
      operationId: listPets
      responses:
        "200":
          description: ok
          content:
            application/json:
              schema:
                type: object
                properties:
                  items: { type: array, items: { type: string } }
                  next: { type: string }
"#;

    fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, content).unwrap();
        path
    }

    fn operation_names(ir: &IrSpec) -> Vec<&str> {
        ir.operations().iter().map(|op| op.canonical_name()).collect()
    }

    #[test]
    fn verify_cli() {
        <Cli as clap::CommandFactory>::command().debug_assert();
    }

    #[test]
    fn init_writes_default_config() {
        let dir = tempfile::tempdir().unwrap();
        cmd_init(dir.path(), false).unwrap();

        let written = fs::read_to_string(dir.path().join(CONFIG_FILE_NAME)).unwrap();
        assert_eq!(written, config::default_config_content());

        assert!(cmd_init(dir.path(), false).is_err());
        cmd_init(dir.path(), true).unwrap();
    }

    #[test]
    fn missing_config_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = project_config(dir.path()).unwrap();
        assert_eq!(config.naming.strategy, NamingStrategy::UseOperationId);
        assert_eq!(input_path(dir.path(), None, &config), dir.path().join("openapi.yaml"));
    }

    #[test]
    fn project_config_drives_input_and_naming() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            CONFIG_FILE_NAME,
            "input: api.yaml\nnaming:\n  strategy: use_route_based\n",
        );
        write(dir.path(), "api.yaml", TINY);

        let config = project_config(dir.path()).unwrap();
        let path = input_path(dir.path(), None, &config);
        let ir = build_ir(read_document(&path).unwrap(), &config).unwrap();
        assert_eq!(operation_names(&ir), vec!["getPets"]);
    }

    #[test]
    fn malformed_config_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), CONFIG_FILE_NAME, "naming: [not, a, map]\n");
        assert!(project_config(dir.path()).is_err());
    }

    #[test]
    fn json_documents_parse_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            dir.path(),
            "api.json",
            r#"{"openapi":"3.1.0","info":{"title":"J","version":"1"},"paths":{"/ping":{"get":{"responses":{"200":{"description":"ok"}}}}}}"#,
        );
        let ir = build_ir(read_document(&path).unwrap(), &OasirConfig::default()).unwrap();
        assert_eq!(operation_names(&ir), vec!["getPing"]);
    }

    #[test]
    fn validate_accepts_and_rejects() {
        let dir = tempfile::tempdir().unwrap();
        let good = write(dir.path(), "good.yaml", TINY);
        cmd_validate(dir.path(), Some(good)).unwrap();

        let old = write(
            dir.path(),
            "old.yaml",
            "openapi: \"2.0\"\ninfo: { title: Old, version: \"1\" }\npaths: {}\n",
        );
        assert!(cmd_validate(dir.path(), Some(old)).is_err());

        assert!(cmd_validate(dir.path(), Some(dir.path().join("absent.yaml"))).is_err());
    }

    #[test]
    fn inspect_renders_json_summary() {
        let ir = transform::transform(parse::from_yaml(TINY).unwrap()).unwrap();
        let files = InspectRenderer {
            format: InspectFormat::Json,
        }
        .render(&ir)
        .unwrap();

        assert_eq!(files.len(), 1);
        assert_eq!(files[0].path, "ir-summary.json");
        let summary: serde_json::Value = serde_json::from_str(&files[0].content).unwrap();
        assert_eq!(summary["info"]["title"], "Tiny");
        assert_eq!(summary["operations"][0]["name"], "listPets");
        assert_eq!(summary["operations"][0]["paginated"], true);
        assert_eq!(summary["modules"][0]["name"], "pets");
        assert_eq!(summary["schemas"][0]["name"], "ListPetsInput");
        assert_eq!(summary["schemas"][0]["synthesized"], true);
    }

    #[test]
    fn inspect_renders_yaml_summary() {
        let ir = transform::transform(parse::from_yaml(TINY).unwrap()).unwrap();
        let files = InspectRenderer {
            format: InspectFormat::Yaml,
        }
        .render(&ir)
        .unwrap();

        assert_eq!(files[0].path, "ir-summary.yaml");
        assert!(files[0].content.contains("name: listPets"));
    }
}
