use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tagtree::utils::{ensure_database_directory, get_database_path, slugify};
use tagtree::{
    Database, DocumentId, HierarchyConfig, HierarchyError, HierarchyManager, NodeRef, SortField,
    TagId, TagRecord, TagService, TagStore, TagType, TagValidationError,
};
use tracing_subscriber::EnvFilter;

/// tagtree - hierarchical tag taxonomy CLI
#[derive(Parser)]
#[command(name = "tagtree")]
#[command(about = "Browse and maintain a hierarchical tag taxonomy")]
#[command(version)]
struct Cli {
    /// Path to the tag database (defaults to TAGTREE_DB or the user data directory)
    #[arg(long, global = true, value_name = "PATH")]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand)]
enum Commands {
    /// Create a new tag
    Add(AddCommand),
    /// Change an existing tag
    Edit(EditCommand),
    /// Delete a tag, moving its children up one level
    Delete(IdArg),
    /// Print the tag tree with document totals
    Tree(TreeCommand),
    /// Show tags matching a query together with their ancestors
    Search(SearchCommand),
    /// Show details for one tag
    Show(IdArg),
    /// Tag a document
    Tag(DocumentTagArgs),
    /// Remove a tag from a document
    Untag(DocumentTagArgs),
    /// Print summary figures for the taxonomy
    Stats,
}

#[derive(Args)]
struct AddCommand {
    /// Display name of the tag
    #[arg(value_name = "NAME")]
    name: String,

    /// Tag id (defaults to the slug of the name)
    #[arg(long)]
    id: Option<String>,

    /// Parent tag id
    #[arg(short, long)]
    parent: Option<String>,

    /// Tag type: client, technology, status, category, priority or custom
    #[arg(short = 't', long = "type")]
    tag_type: Option<TagType>,

    #[arg(long)]
    color: Option<String>,

    #[arg(long)]
    icon: Option<String>,

    #[arg(short, long)]
    description: Option<String>,
}

#[derive(Args)]
struct EditCommand {
    /// Id of the tag to change
    #[arg(value_name = "ID")]
    id: String,

    /// New display name (the slug follows it)
    #[arg(long)]
    name: Option<String>,

    /// New parent tag id
    #[arg(short, long, conflicts_with = "root")]
    parent: Option<String>,

    /// Make the tag a root
    #[arg(long)]
    root: bool,

    #[arg(short = 't', long = "type")]
    tag_type: Option<TagType>,

    #[arg(long)]
    color: Option<String>,

    #[arg(long)]
    icon: Option<String>,

    #[arg(short, long)]
    description: Option<String>,
}

#[derive(Args)]
struct IdArg {
    /// Tag id
    #[arg(value_name = "ID")]
    id: String,
}

#[derive(Args)]
struct TreeCommand {
    /// Only expand nodes above this depth
    #[arg(long, value_name = "N")]
    depth: Option<usize>,

    /// Sibling ordering
    #[arg(long, value_enum, default_value_t = SortArg::Name)]
    sort: SortArg,
}

#[derive(Args)]
struct SearchCommand {
    /// Case-insensitive text matched against name, type and description
    #[arg(value_name = "QUERY")]
    query: String,
}

#[derive(Args)]
struct DocumentTagArgs {
    /// Document identifier
    #[arg(value_name = "DOCUMENT")]
    document: String,

    /// Tag id
    #[arg(value_name = "TAG")]
    tag: String,
}

#[derive(Clone, Copy, ValueEnum)]
enum SortArg {
    Name,
    Type,
    Count,
}

impl From<SortArg> for SortField {
    fn from(arg: SortArg) -> Self {
        match arg {
            SortArg::Name => SortField::Name,
            SortArg::Type => SortField::Type,
            SortArg::Count => SortField::TotalCount,
        }
    }
}

fn main() {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();

    if let Err(e) = run(&cli) {
        // Determine exit code based on error type
        let exit_code = if is_user_error(&e) { 1 } else { 2 };
        eprintln!("Error: {e:#}");
        std::process::exit(exit_code);
    }
}

/// Logs go to stderr so stdout stays clean for tree output.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Determines if an error is a user error (vs internal error).
///
/// User errors are unknown ids and rejected tag writes, wherever they sit in
/// the context chain. Internal errors include database failures and I/O errors.
fn is_user_error(error: &anyhow::Error) -> bool {
    error
        .chain()
        .any(|cause| cause.is::<HierarchyError>() || cause.is::<TagValidationError>())
}

fn run(cli: &Cli) -> Result<()> {
    let db_path = match &cli.db {
        Some(path) => path.clone(),
        None => get_database_path()?,
    };
    let service = TagService::new(open_database(&db_path)?);

    let lines = match &cli.command {
        Commands::Add(cmd) => execute_add(cmd, &service)?,
        Commands::Edit(cmd) => execute_edit(cmd, &service)?,
        Commands::Delete(arg) => execute_delete(&arg.id, &service)?,
        Commands::Tree(cmd) => execute_tree(cmd, &service)?,
        Commands::Search(cmd) => execute_search(&cmd.query, &service)?,
        Commands::Show(arg) => execute_show(&arg.id, &service)?,
        Commands::Tag(args) => execute_tag(args, &service)?,
        Commands::Untag(args) => execute_untag(args, &service)?,
        Commands::Stats => execute_stats(&service)?,
    };

    for line in lines {
        println!("{line}");
    }
    Ok(())
}

fn open_database(db_path: &Path) -> Result<Database> {
    ensure_database_directory(db_path)?;
    Database::open(db_path).context("Failed to open database")
}

/// Builds a manager holding the current snapshot of the store.
fn load_manager(service: &TagService) -> Result<HierarchyManager> {
    let mut manager = HierarchyManager::new(HierarchyConfig::from_env());
    manager
        .refresh_from(service)
        .context("Failed to load tags")?;
    Ok(manager)
}

fn execute_add(cmd: &AddCommand, service: &TagService) -> Result<Vec<String>> {
    if cmd.name.trim().is_empty() {
        return Err(TagValidationError::EmptyName.into());
    }

    let id = cmd.id.clone().unwrap_or_else(|| slugify(&cmd.name));
    let mut builder = TagRecord::builder(id, cmd.name.trim())
        .tag_type(cmd.tag_type.unwrap_or_default())
        .parent_id(cmd.parent.clone().map(TagId::new));
    if let Some(color) = &cmd.color {
        builder = builder.color(color);
    }
    if let Some(icon) = &cmd.icon {
        builder = builder.icon(icon);
    }
    if let Some(description) = &cmd.description {
        builder = builder.description(description);
    }

    let tag = service
        .create_tag(&builder.build())
        .context("Failed to create tag")?;
    Ok(vec![format!("Tag created (id: {})", tag.id)])
}

fn execute_edit(cmd: &EditCommand, service: &TagService) -> Result<Vec<String>> {
    let id = TagId::new(cmd.id.as_str());
    let mut tag = service
        .get_tag(id.as_str())?
        .ok_or_else(|| HierarchyError::NotFound(id.clone()))?;

    if let Some(name) = &cmd.name {
        tag.name = name.trim().to_string();
        tag.slug = slugify(name);
    }
    if cmd.root {
        tag.parent_id = None;
    } else if let Some(parent) = &cmd.parent {
        tag.parent_id = Some(TagId::new(parent.as_str()));
    }
    if let Some(tag_type) = cmd.tag_type {
        tag.tag_type = tag_type;
    }
    if let Some(color) = &cmd.color {
        tag.color = Some(color.clone());
    }
    if let Some(icon) = &cmd.icon {
        tag.icon = Some(icon.clone());
    }
    if let Some(description) = &cmd.description {
        tag.description = Some(description.clone());
    }

    let updated = service
        .update_tag(&id, &tag)
        .context("Failed to update tag")?;
    Ok(vec![format!("Tag updated (id: {})", updated.id)])
}

fn execute_delete(id: &str, service: &TagService) -> Result<Vec<String>> {
    service
        .delete_tag(&TagId::new(id))
        .context("Failed to delete tag")?;
    Ok(vec![format!("Tag deleted (id: {id})")])
}

fn execute_tree(cmd: &TreeCommand, service: &TagService) -> Result<Vec<String>> {
    let mut manager = load_manager(service)?;
    if manager.is_empty() {
        return Ok(vec!["No tags yet".to_string()]);
    }

    let sort: SortField = cmd.sort.into();
    if sort != SortField::Name {
        manager.sort_by_field(sort);
    }
    manager.collapse_all();
    manager.expand_to_level(cmd.depth.unwrap_or(usize::MAX));

    Ok(render_rows(&manager.visible_rows(None)))
}

fn execute_search(query: &str, service: &TagService) -> Result<Vec<String>> {
    let mut manager = load_manager(service)?;
    let visible = manager.search_visible(query);
    if visible.is_empty() {
        return Ok(vec![format!("No tags match \"{query}\"")]);
    }

    manager.collapse_all();
    let hits = manager.reveal_matches(query);
    let mut lines = render_rows(&manager.visible_rows(Some(&visible)));
    if hits > 0 {
        lines.push(format!("{hits} matching tag(s)"));
    }
    Ok(lines)
}

fn execute_show(id: &str, service: &TagService) -> Result<Vec<String>> {
    let manager = load_manager(service)?;
    let node = manager.require_node(id)?;
    let record = node.record();
    let separator = &manager.config().path_separator;

    let mut lines = vec![
        format!("id:          {}", record.id),
        format!("name:        {}", record.display_name()),
        format!("slug:        {}", record.slug),
        format!("type:        {}", record.tag_type),
        format!("path:        {}", node.path(separator)),
        format!("level:       {}", node.level()),
        format!(
            "documents:   {} direct, {} total",
            node.direct_count(),
            node.total_count()
        ),
    ];
    if let Some(description) = &record.description {
        lines.push(format!("description: {description}"));
    }
    let children: Vec<&str> = node.children().map(|c| c.display_name()).collect();
    if !children.is_empty() {
        lines.push(format!("children:    {}", children.join(", ")));
    }
    Ok(lines)
}

fn execute_tag(args: &DocumentTagArgs, service: &TagService) -> Result<Vec<String>> {
    let document = DocumentId::new(args.document.as_str());
    let added = service.tag_document(&document, &TagId::new(args.tag.as_str()))?;
    Ok(vec![if added {
        format!("Tagged {} with {}", args.document, args.tag)
    } else {
        format!("{} already tagged with {}", args.document, args.tag)
    }])
}

fn execute_untag(args: &DocumentTagArgs, service: &TagService) -> Result<Vec<String>> {
    let document = DocumentId::new(args.document.as_str());
    let removed = service.untag_document(&document, &TagId::new(args.tag.as_str()))?;
    Ok(vec![if removed {
        format!("Removed {} from {}", args.tag, args.document)
    } else {
        format!("{} was not tagged with {}", args.document, args.tag)
    }])
}

fn execute_stats(service: &TagService) -> Result<Vec<String>> {
    let manager = load_manager(service)?;
    let stats = manager.stats();
    Ok(vec![
        format!("tags:      {}", stats.nodes),
        format!("roots:     {}", stats.roots),
        format!("max depth: {}", stats.max_depth),
        format!("tagged:    {}", stats.documents),
        format!("warnings:  {}", manager.warnings().len()),
    ])
}

/// Renders display rows as an indented outline: `name (total) [id]`.
fn render_rows(rows: &[(NodeRef<'_>, usize)]) -> Vec<String> {
    rows.iter()
        .map(|(node, level)| {
            let marker = match (node.children().next().is_some(), node.is_expanded()) {
                (false, _) => ' ',
                (true, true) => '-',
                (true, false) => '+',
            };
            format!(
                "{}{marker} {} ({}) [{}]",
                "  ".repeat(*level),
                node.display_name(),
                node.total_count(),
                node.id()
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> TagService {
        TagService::new(Database::in_memory().expect("failed to create in-memory database"))
    }

    fn add(service: &TagService, name: &str, parent: Option<&str>) {
        let cmd = AddCommand {
            name: name.to_string(),
            id: None,
            parent: parent.map(String::from),
            tag_type: None,
            color: None,
            icon: None,
            description: None,
        };
        execute_add(&cmd, service).expect("failed to add tag");
    }

    fn edit(id: &str) -> EditCommand {
        EditCommand {
            id: id.to_string(),
            name: None,
            parent: None,
            root: false,
            tag_type: None,
            color: None,
            icon: None,
            description: None,
        }
    }

    #[test]
    fn cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn add_defaults_id_to_slug() {
        let service = service();
        add(&service, "Machine Learning", None);

        assert!(service.get_tag("machine-learning").unwrap().is_some());
    }

    #[test]
    fn add_rejects_blank_name() {
        let service = service();
        let cmd = AddCommand {
            name: "   ".to_string(),
            id: None,
            parent: None,
            tag_type: None,
            color: None,
            icon: None,
            description: None,
        };
        let err = execute_add(&cmd, &service).unwrap_err();
        assert!(err.to_string().contains("cannot be empty"));
        assert!(is_user_error(&err));
    }

    #[test]
    fn tree_renders_indented_outline_with_totals() {
        let service = service();
        add(&service, "Root", None);
        add(&service, "Child", Some("root"));
        add(&service, "Leaf", Some("child"));
        service
            .tag_document(&DocumentId::new("doc"), &TagId::new("leaf"))
            .unwrap();

        let cmd = TreeCommand {
            depth: None,
            sort: SortArg::Name,
        };
        let lines = execute_tree(&cmd, &service).unwrap();
        assert_eq!(
            lines,
            vec![
                "- Root (1) [root]",
                "  - Child (1) [child]",
                "      Leaf (1) [leaf]",
            ]
        );
    }

    #[test]
    fn tree_depth_limits_expansion() {
        let service = service();
        add(&service, "Root", None);
        add(&service, "Child", Some("root"));
        add(&service, "Leaf", Some("child"));

        let cmd = TreeCommand {
            depth: Some(1),
            sort: SortArg::Name,
        };
        let lines = execute_tree(&cmd, &service).unwrap();
        assert_eq!(lines, vec!["- Root (0) [root]", "  + Child (0) [child]"]);
    }

    #[test]
    fn search_shows_path_to_match_only() {
        let service = service();
        add(&service, "Engineering", None);
        add(&service, "Rust", Some("engineering"));
        add(&service, "Go", Some("engineering"));
        add(&service, "Sales", None);

        let lines = execute_search("rust", &service).unwrap();
        assert_eq!(
            lines,
            vec![
                "- Engineering (0) [engineering]",
                "    Rust (0) [rust]",
                "1 matching tag(s)",
            ]
        );

        let none = execute_search("cobol", &service).unwrap();
        assert_eq!(none, vec!["No tags match \"cobol\""]);
    }

    #[test]
    fn edit_moves_tag_and_root_flag_detaches() {
        let service = service();
        add(&service, "A", None);
        add(&service, "B", None);
        add(&service, "C", Some("a"));

        let mut cmd = edit("c");
        cmd.parent = Some("b".to_string());
        execute_edit(&cmd, &service).unwrap();
        assert_eq!(
            service.get_tag("c").unwrap().unwrap().parent_id,
            Some(TagId::new("b"))
        );

        let mut cmd = edit("c");
        cmd.root = true;
        execute_edit(&cmd, &service).unwrap();
        assert_eq!(service.get_tag("c").unwrap().unwrap().parent_id, None);
    }

    #[test]
    fn edit_unknown_tag_is_user_error() {
        let service = service();
        let err = execute_edit(&edit("ghost"), &service).unwrap_err();
        assert!(is_user_error(&err));
    }

    #[test]
    fn show_prints_path_and_counts() {
        let service = service();
        add(&service, "Root", None);
        add(&service, "Child", Some("root"));

        let lines = execute_show("child", &service).unwrap();
        assert!(lines.contains(&"path:        Root > Child".to_string()));
        assert!(lines.contains(&"level:       1".to_string()));

        let err = execute_show("missing", &service).unwrap_err();
        assert!(is_user_error(&err));
    }

    #[test]
    fn delete_then_stats_reflect_reparenting() {
        let service = service();
        add(&service, "Root", None);
        add(&service, "Middle", Some("root"));
        add(&service, "Leaf", Some("middle"));

        execute_delete("middle", &service).unwrap();
        let lines = execute_stats(&service).unwrap();
        assert!(lines.contains(&"tags:      2".to_string()));
        assert!(lines.contains(&"max depth: 1".to_string()));
    }

    #[test]
    fn tag_and_untag_report_changes() {
        let service = service();
        add(&service, "Root", None);
        let args = DocumentTagArgs {
            document: "doc-1".to_string(),
            tag: "root".to_string(),
        };

        assert_eq!(
            execute_tag(&args, &service).unwrap(),
            vec!["Tagged doc-1 with root"]
        );
        assert_eq!(
            execute_tag(&args, &service).unwrap(),
            vec!["doc-1 already tagged with root"]
        );
        assert_eq!(
            execute_untag(&args, &service).unwrap(),
            vec!["Removed root from doc-1"]
        );
    }

    #[test]
    fn duplicate_add_is_user_error() {
        let service = service();
        add(&service, "Root", None);

        let cmd = AddCommand {
            name: "Root".to_string(),
            id: None,
            parent: None,
            tag_type: None,
            color: None,
            icon: None,
            description: None,
        };
        let err = execute_add(&cmd, &service).unwrap_err();
        assert!(format!("{err:#}").contains("already exists"));
        assert!(is_user_error(&err));
    }

    #[test]
    fn self_parent_edit_is_user_error() {
        let service = service();
        add(&service, "Root", None);

        let mut cmd = edit("root");
        cmd.parent = Some("root".to_string());
        let err = execute_edit(&cmd, &service).unwrap_err();
        assert!(format!("{err:#}").contains("own parent"));
        assert!(is_user_error(&err));
    }

    #[test]
    fn blank_name_edit_is_user_error() {
        let service = service();
        add(&service, "Root", None);

        let mut cmd = edit("root");
        cmd.name = Some("  ".to_string());
        let err = execute_edit(&cmd, &service).unwrap_err();
        assert!(is_user_error(&err));
    }

    #[test]
    fn context_wrapped_not_found_is_user_error() {
        let service = service();
        let err = execute_delete("ghost", &service).unwrap_err();
        assert!(is_user_error(&err));
    }

    #[test]
    fn internal_errors_are_not_user_errors() {
        let err = anyhow::anyhow!("disk I/O error");
        assert!(!is_user_error(&err));
    }
}
