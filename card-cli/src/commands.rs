//! Subcommand execution.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Context;
use card_core::{
    export_filename, list_subpaths, Background, CardDocument, Component, ComponentId,
    ComponentPatch, ComponentTag, DocumentStore, EditorSession, FileStore, MapField, Point,
    StoreError,
};
use serde_json::Value;

use crate::{BackgroundArg, CliConfig, Command};

/// Errors reported by subcommands.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// The document file does not exist yet.
    #[error("No document at {0}; create one with `mapcard new`")]
    MissingDocument(PathBuf),
    /// `new` would overwrite an existing file.
    #[error("{0} already exists; pass --force to overwrite")]
    AlreadyExists(PathBuf),
    /// No component has the given id.
    #[error("Component not found: {0}")]
    UnknownComponent(String),
    /// A list position outside `1..=len`.
    #[error("Position {position} is out of range for {len} components")]
    InvalidPosition {
        /// One-based position given.
        position: usize,
        /// Number of components.
        len: usize,
    },
}

/// Run one subcommand, writing its output to `out`.
///
/// # Errors
///
/// Returns an error if the document cannot be read, parsed, edited, or
/// written.
pub fn run(command: Command, config: &CliConfig, out: &mut impl Write) -> anyhow::Result<()> {
    match command {
        Command::New {
            path,
            name,
            width,
            height,
            force,
        } => {
            let store = FileStore::at_path(&path);
            if !force && store.load()?.is_some() {
                return Err(CliError::AlreadyExists(path).into());
            }
            let document = CardDocument::new(name, width, height)?;
            let session = EditorSession::new(document, config.editor)?;
            session.save_to(&store)?;
            writeln!(out, "Created {}", path.display())?;
        }
        Command::Card {
            path,
            name,
            width,
            height,
            corner_radius,
        } => {
            let (mut session, store) = open(&path, config)?;
            if width.is_some() || height.is_some() {
                let doc = session.document();
                let width = width.unwrap_or(doc.width());
                let height = height.unwrap_or(doc.height());
                session.set_dimensions(width, height)?;
            }
            if let Some(radius) = corner_radius {
                session.set_card_corner_radius(radius)?;
            }
            if let Some(name) = name {
                session.set_config_name(name);
            }
            session.save_to(&store)?;
            let doc = session.document();
            writeln!(
                out,
                "{} ({}x{}), r={}",
                doc.config_name,
                doc.width(),
                doc.height(),
                doc.card_corner_radius
            )?;
        }
        Command::Show { path } => {
            let (session, _) = open(&path, config)?;
            let doc = session.document();
            writeln!(out, "{} ({}x{})", doc.config_name, doc.width(), doc.height())?;
            for (label, component) in doc.component_labels().iter().zip(doc.components()) {
                writeln!(out, "{label} [{}]", component.id)?;
            }
        }
        Command::Add {
            path,
            kind,
            x,
            y,
            field,
        } => {
            let (mut session, store) = open(&path, config)?;
            let pointer = Point::new(x, y);
            let id = match (kind, field) {
                (ComponentTag::Text, Some(field)) => {
                    session.add_text_field(MapField::from(field), pointer)?
                }
                (_, Some(_)) => {
                    tracing::warn!("--field only applies to text components; ignoring it");
                    session.add_at(kind, pointer)?
                }
                (_, None) => session.add_at(kind, pointer)?,
            };
            session.save_to(&store)?;
            writeln!(out, "{id}")?;
        }
        Command::Remove { path, id } => {
            let (mut session, store) = open(&path, config)?;
            let component_id = ComponentId::from(id.as_str());
            if session.remove(&component_id).is_none() {
                return Err(CliError::UnknownComponent(id).into());
            }
            session.save_to(&store)?;
            writeln!(out, "Removed {id}")?;
        }
        Command::Reorder { path, from, to } => {
            let (mut session, store) = open(&path, config)?;
            let len = session.document().len();
            let from_index = index_of_position(from, len)?;
            let to_index = index_of_position(to, len)?;
            session.move_component(from_index, to_index)?;
            session.save_to(&store)?;
            for label in session.document().component_labels() {
                writeln!(out, "{label}")?;
            }
        }
        Command::Set {
            path,
            id,
            key,
            value,
        } => {
            let (mut session, store) = open(&path, config)?;
            let component_id = ComponentId::from(id.as_str());
            set_field(&mut session, &component_id, &key, &value)?;
            session.save_to(&store)?;
            if let Some(component) = session.document().get(&component_id) {
                writeln!(out, "{}", serde_json::to_string_pretty(component)?)?;
            }
        }
        Command::Background { path, kind } => {
            let (mut session, store) = open(&path, config)?;
            let background = match kind {
                BackgroundArg::Color { color } => Background::Color { color },
                BackgroundArg::Cover { path, blur } => Background::Cover { path, blur },
            };
            session.set_background(background);
            session.save_to(&store)?;
            writeln!(out, "{}", serde_json::to_string(&session.document().background)?)?;
        }
        Command::Resolve { path, data } => {
            let (session, _) = open(&path, config)?;
            let data = read_data(&data)?;
            writeln!(out, "{}", serde_json::to_string_pretty(&session.view(&data))?)?;
        }
        Command::Tokens { data, prefix } => {
            let data = read_data(&data)?;
            for entry in list_subpaths(&data, &prefix) {
                let marker = if entry.leaf_is_object { "." } else { "" };
                writeln!(out, "{}{marker}", entry.full_path)?;
            }
        }
        Command::Export { path, out: out_dir } => {
            let (session, _) = open(&path, config)?;
            let dir = out_dir
                .or_else(|| config.data_dir.clone())
                .ok_or(StoreError::NoDataDirectory)?;
            let target = dir.join(export_filename(&session.document().config_name));
            FileStore::at_path(&target).save(&session.document_text()?)?;
            tracing::info!("Exported {}", target.display());
            writeln!(out, "{}", target.display())?;
        }
    }
    Ok(())
}

fn open(path: &Path, config: &CliConfig) -> anyhow::Result<(EditorSession, FileStore)> {
    let store = FileStore::at_path(path);
    let mut session = EditorSession::new(CardDocument::default(), config.editor)?;
    let loaded = session
        .load_from(&store)
        .with_context(|| format!("Failed to open {}", path.display()))?;
    if !loaded {
        return Err(CliError::MissingDocument(path.to_path_buf()).into());
    }
    Ok((session, store))
}

fn index_of_position(position: usize, len: usize) -> Result<usize, CliError> {
    position
        .checked_sub(1)
        .filter(|index| *index < len)
        .ok_or(CliError::InvalidPosition { position, len })
}

fn set_field(
    session: &mut EditorSession,
    id: &ComponentId,
    key: &str,
    raw: &str,
) -> anyhow::Result<()> {
    if key == "type" {
        let tag: ComponentTag = raw.parse()?;
        let current = session
            .document()
            .get(id)
            .map(Component::tag)
            .ok_or_else(|| CliError::UnknownComponent(id.to_string()))?;
        if current != tag && !session.retag(id, tag) {
            anyhow::bail!("Cannot change {id} from {current} to {tag}");
        }
        return Ok(());
    }

    let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
    let patch = ComponentPatch::field(key, value);
    if patch.is_empty() {
        tracing::warn!("Field {key} was not recognised or had the wrong type; nothing changed");
    }
    if !session.update(id, &patch)? {
        return Err(CliError::UnknownComponent(id.to_string()).into());
    }
    Ok(())
}

fn read_data(path: &Path) -> anyhow::Result<Value> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("{} is not valid JSON", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use card_core::{from_document_text, ComponentKind, EditorConfig, GridPolicy};
    use tempfile::TempDir;

    fn fixed_grid() -> CliConfig {
        CliConfig {
            editor: EditorConfig {
                grid: GridPolicy::Fixed { step: 10.0 },
                ..EditorConfig::default()
            },
            data_dir: None,
        }
    }

    fn exec(command: Command, config: &CliConfig) -> String {
        let mut out = Vec::new();
        run(command, config, &mut out).expect("command succeeds");
        String::from_utf8(out).expect("utf8")
    }

    fn new_card(dir: &TempDir) -> PathBuf {
        let path = dir.path().join("card.json");
        exec(
            Command::New {
                path: path.clone(),
                name: "Ranked Card".to_string(),
                width: 900.0,
                height: 300.0,
                force: false,
            },
            &fixed_grid(),
        );
        path
    }

    fn load(path: &Path) -> CardDocument {
        from_document_text(&std::fs::read_to_string(path).expect("read")).expect("parse")
    }

    fn add(path: &Path, kind: ComponentTag) -> ComponentId {
        let id = exec(
            Command::Add {
                path: path.to_path_buf(),
                kind,
                x: 33.0,
                y: 47.0,
                field: None,
            },
            &fixed_grid(),
        );
        ComponentId::from(id.trim())
    }

    #[test]
    fn test_new_refuses_to_overwrite() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = new_card(&dir);
        let result = run(
            Command::New {
                path,
                name: "Other".to_string(),
                width: 10.0,
                height: 10.0,
                force: false,
            },
            &fixed_grid(),
            &mut std::io::sink(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_add_snaps_and_saves() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = new_card(&dir);
        let id = add(&path, ComponentTag::Image);

        let doc = load(&path);
        let image = doc.get(&id).expect("saved");
        assert_eq!(image.position(), Point::new(30.0, 50.0));
    }

    #[test]
    fn test_set_and_retag() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = new_card(&dir);
        let id = add(&path, ComponentTag::RoundedRect);

        let set = |key: &str, value: &str| Command::Set {
            path: path.clone(),
            id: id.to_string(),
            key: key.to_string(),
            value: value.to_string(),
        };
        exec(set("cornerRadius", "24"), &fixed_grid());
        exec(set("fillStyle", "#8ED6FF"), &fixed_grid());
        exec(set("type", "text"), &fixed_grid());

        let doc = load(&path);
        let component = doc.get(&id).expect("saved");
        assert!(matches!(component.kind, ComponentKind::Text(_)));
        assert_eq!(
            component.kind.extra().get("cornerRadius"),
            Some(&serde_json::json!(24.0))
        );
    }

    #[test]
    fn test_set_type_to_current_type_is_a_no_op() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = new_card(&dir);
        let id = add(&path, ComponentTag::RoundedRect);
        let before = std::fs::read_to_string(&path).expect("read");

        exec(
            Command::Set {
                path: path.clone(),
                id: id.to_string(),
                key: "type".to_string(),
                value: "rect".to_string(),
            },
            &fixed_grid(),
        );
        assert_eq!(std::fs::read_to_string(&path).expect("read"), before);
    }

    #[test]
    fn test_set_type_reports_unreadable_fields() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = new_card(&dir);
        let id = add(&path, ComponentTag::RoundedRect);

        // A carried-over field that an image cannot read.
        let mut value: Value =
            serde_json::from_str(&std::fs::read_to_string(&path).expect("read")).expect("json");
        value["components"][0]["clip"] = Value::from("sometimes");
        std::fs::write(&path, serde_json::to_string_pretty(&value).expect("text")).expect("write");
        let before = load(&path);

        let result = run(
            Command::Set {
                path: path.clone(),
                id: id.to_string(),
                key: "type".to_string(),
                value: "image".to_string(),
            },
            &fixed_grid(),
            &mut std::io::sink(),
        );
        assert!(result.is_err());
        assert_eq!(load(&path), before);
    }

    #[test]
    fn test_card_settings() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = new_card(&dir);

        let printed = exec(
            Command::Card {
                path: path.clone(),
                name: Some("Wide Card".to_string()),
                width: Some(600.0),
                height: None,
                corner_radius: Some(12.0),
            },
            &fixed_grid(),
        );
        assert_eq!(printed, "Wide Card (600x300), r=12\n");

        let doc = load(&path);
        assert_eq!(doc.config_name, "Wide Card");
        assert!((doc.width() - 600.0).abs() < f64::EPSILON);
        assert!((doc.height() - 300.0).abs() < f64::EPSILON);
        assert!((doc.card_corner_radius - 12.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_card_rejects_negative_radius() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = new_card(&dir);
        let before = std::fs::read_to_string(&path).expect("read");

        let result = run(
            Command::Card {
                path: path.clone(),
                name: Some("Renamed".to_string()),
                width: None,
                height: None,
                corner_radius: Some(-4.0),
            },
            &fixed_grid(),
            &mut std::io::sink(),
        );
        assert!(result.is_err());
        assert_eq!(std::fs::read_to_string(&path).expect("read"), before);
    }

    #[test]
    fn test_card_rejects_zero_height() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = new_card(&dir);
        let result = run(
            Command::Card {
                path: path.clone(),
                name: None,
                width: None,
                height: Some(0.0),
                corner_radius: None,
            },
            &fixed_grid(),
            &mut std::io::sink(),
        );
        assert!(result.is_err());
        assert!((load(&path).height() - 300.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_show_and_reorder() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = new_card(&dir);
        add(&path, ComponentTag::Text);
        add(&path, ComponentTag::RatingBar);

        let shown = exec(Command::Show { path: path.clone() }, &fixed_grid());
        assert!(shown.starts_with("Ranked Card (900x300)"));
        assert!(shown.contains("2: starRating - (5 ratings)"));

        let reordered = exec(
            Command::Reorder {
                path: path.clone(),
                from: 2,
                to: 1,
            },
            &fixed_grid(),
        );
        assert!(reordered.starts_with("1: starRating"));

        let bad = run(
            Command::Reorder { path, from: 0, to: 1 },
            &fixed_grid(),
            &mut std::io::sink(),
        );
        assert!(bad.is_err());
    }

    #[test]
    fn test_remove_unknown_fails() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = new_card(&dir);
        let result = run(
            Command::Remove {
                path,
                id: "ghost".to_string(),
            },
            &fixed_grid(),
            &mut std::io::sink(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_resolve_and_tokens() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = new_card(&dir);
        add(&path, ComponentTag::Image);
        let data = dir.path().join("map.json");
        std::fs::write(
            &data,
            r#"{"metadata":{"songName":"x"},"versions":[{"coverURL":"https://cdn/c.jpg"}]}"#,
        )
        .expect("write data");

        let view = exec(
            Command::Resolve {
                path,
                data: data.clone(),
            },
            &fixed_grid(),
        );
        assert!(view.contains("https://cdn/c.jpg"));

        let tokens = exec(
            Command::Tokens {
                data,
                prefix: String::new(),
            },
            &fixed_grid(),
        );
        assert_eq!(tokens, "metadata.\nversions.\n");
    }

    #[test]
    fn test_export_uses_config_name() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = new_card(&dir);
        let out_dir = dir.path().join("exports");
        let printed = exec(
            Command::Export {
                path: path.clone(),
                out: Some(out_dir.clone()),
            },
            &fixed_grid(),
        );
        let target = out_dir.join("Ranked_Card.json");
        assert_eq!(printed.trim(), target.display().to_string());
        assert_eq!(load(&target), load(&path));
    }

    #[test]
    fn test_export_without_directory_fails() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = new_card(&dir);
        let result = run(Command::Export { path, out: None }, &fixed_grid(), &mut std::io::sink());
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_document() {
        let dir = tempfile::tempdir().expect("tempdir");
        let result = run(
            Command::Show {
                path: dir.path().join("nope.json"),
            },
            &fixed_grid(),
            &mut std::io::sink(),
        );
        let err = result.expect_err("missing file");
        assert!(err.downcast_ref::<CliError>().is_some());
    }
}
