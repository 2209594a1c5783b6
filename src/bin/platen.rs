use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "platen", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render one card against one of its data rows and write a PNG.
    Render(RenderArgs),
    /// Validate a card JSON without rendering it.
    Check(CheckArgs),
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Input card JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Data row index (0-based).
    #[arg(long, default_value_t = 0)]
    row: usize,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    /// Directory used to resolve external references in the card's markup.
    #[arg(long)]
    resources_dir: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct CheckArgs {
    /// Input card JSON.
    #[arg(long = "in")]
    in_path: PathBuf,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Command::Render(args) => cmd_render(args),
        Command::Check(args) => cmd_check(args),
    }
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let card = platen::CardDef::from_path(&args.in_path)
        .with_context(|| format!("load card '{}'", args.in_path.display()))?;
    card.validate()?;

    let opts = platen::RenderClientOpts {
        rasterizer_opts: platen::RasterizerOpts {
            resources_dir: args.resources_dir,
            viewport: Some(platen::RasterSize::new(card.width, card.height)?),
        },
        ..platen::RenderClientOpts::default()
    };
    let client = platen::RenderClient::new(opts);

    let Some(uri) = client.render(&card, args.row)? else {
        anyhow::bail!(
            "nothing to render: card has no data source or row {} is out of range",
            args.row
        );
    };

    let bmp = platen::decode_png(&uri)?;
    if let Some(parent) = args.out.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    image::save_buffer_with_format(
        &args.out,
        &bmp.data,
        bmp.width,
        bmp.height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", args.out.display()))?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_check(args: CheckArgs) -> anyhow::Result<()> {
    let card = platen::CardDef::from_path(&args.in_path)
        .with_context(|| format!("load card '{}'", args.in_path.display()))?;
    card.validate()?;
    eprintln!(
        "ok: {}x{}, {} layer(s), {} data row(s)",
        card.width,
        card.height,
        card.layers.len(),
        card.data.len()
    );
    Ok(())
}
