use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use uuid::Uuid;
use wire::{
    CalculationResult, ClientDetails, DimensionUpdate, Dimensions, DocumentRef, ErrorBody,
    MaterialSummary, ObstacleEntry, QuoteDetail, QuoteListItem, RoofType,
};
use wizard::controller::{Stage, Wizard, WizardError};
use wizard::sync::{QuoteSync, SyncError};

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("invalid roof type `{0}` (expected gable, hip, mansard, or flat)")]
    InvalidRoofType(String),
    #[error("no active materials in the catalog")]
    EmptyCatalog,
    #[error("material {0} is not in the catalog")]
    UnknownMaterial(i64),
    #[error("reading `{path}` failed: {source}")]
    ReadImage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Wizard(#[from] WizardError),
    #[error(transparent)]
    Geometry(#[from] wizard::geometry::GeometryError),
    #[error(transparent)]
    Sync(#[from] SyncError),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "roofquote", about = "Roof quote authoring CLI")]
struct Cli {
    #[arg(long, env = "ROOFQUOTE_BASE_URL", default_value = "http://127.0.0.1:3000")]
    base_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Material catalog operations.
    Materials(MaterialsCommand),
    /// Quote CRUD operations.
    Quote(QuoteCommand),
    /// Drive the full authoring wizard against a running server.
    Wizard(WizardCommand),
}

#[derive(Args, Debug)]
struct MaterialsCommand {
    #[command(subcommand)]
    command: MaterialsSubcommand,
}

#[derive(Subcommand, Debug)]
enum MaterialsSubcommand {
    /// List active materials.
    List,
}

#[derive(Args, Debug)]
struct QuoteCommand {
    #[command(subcommand)]
    command: QuoteSubcommand,
}

#[derive(Subcommand, Debug)]
enum QuoteSubcommand {
    /// List quotes, newest first.
    List,
    /// Create an empty draft quote.
    Create,
    /// Print the full state of one quote.
    Show { id: Uuid },
    /// Copy a quote into a fresh draft.
    Duplicate { id: Uuid },
    /// Download the generated offer document.
    Offer { id: Uuid },
}

#[derive(Args, Debug)]
struct WizardCommand {
    #[command(subcommand)]
    command: WizardSubcommand,
}

#[derive(Subcommand, Debug)]
enum WizardSubcommand {
    /// Run all six stages: upload, extraction, verification, material,
    /// calculation, offer.
    Run(RunArgs),
}

#[derive(Args, Debug)]
struct RunArgs {
    /// Roof plan image (jpg, png, webp, or pdf).
    #[arg(long)]
    image: PathBuf,

    /// Material id; defaults to the first catalog entry.
    #[arg(long)]
    material: Option<i64>,

    /// Override the extracted length, in meters.
    #[arg(long)]
    length: Option<f64>,

    /// Override the extracted width, in meters.
    #[arg(long)]
    width: Option<f64>,

    /// Override the extracted pitch, in degrees.
    #[arg(long)]
    pitch: Option<i32>,

    /// Override the extracted roof type (gable, hip, mansard, flat).
    #[arg(long)]
    roof_type: Option<String>,

    #[arg(long, default_value = "")]
    client_name: String,

    #[arg(long, default_value = "")]
    client_email: String,

    #[arg(long, default_value = "")]
    client_phone: String,

    #[arg(long, default_value = "")]
    client_address: String,
}

// =============================================================================
// HTTP SYNC ADAPTER
// =============================================================================

/// HTTP implementation of the wizard's backend boundary.
struct HttpQuoteSync {
    http: reqwest::Client,
    base_url: String,
}

impl HttpQuoteSync {
    fn new(base_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_owned(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Turn a non-success response into `SyncError::Api`, decoding the
    /// server's error body when it has one.
    async fn check(response: reqwest::Response) -> Result<reqwest::Response, SyncError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response
            .json::<ErrorBody>()
            .await
            .map(|body| body.error)
            .unwrap_or_else(|_| status.to_string());
        Err(SyncError::Api { status: status.as_u16(), message })
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T, SyncError> {
        let response = self
            .http
            .get(self.url(path))
            .send()
            .await
            .map_err(|e| SyncError::Transport(e.to_string()))?;
        Self::check(response)
            .await?
            .json()
            .await
            .map_err(|e| SyncError::Decode(e.to_string()))
    }

    async fn post_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<T, SyncError> {
        let response = self
            .http
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .map_err(|e| SyncError::Transport(e.to_string()))?;
        Self::check(response)
            .await?
            .json()
            .await
            .map_err(|e| SyncError::Decode(e.to_string()))
    }

    async fn list_materials(&self) -> Result<Vec<MaterialSummary>, SyncError> {
        self.get_json("/api/materials").await
    }

    async fn list_quotes(&self) -> Result<Vec<QuoteListItem>, SyncError> {
        self.get_json("/api/quotes").await
    }

    async fn duplicate_quote(&self, quote_id: Uuid) -> Result<QuoteDetail, SyncError> {
        self.post_json(&format!("/api/quotes/{quote_id}/duplicate"), &serde_json::json!({}))
            .await
    }

    async fn fetch_offer_body(&self, quote_id: Uuid) -> Result<String, SyncError> {
        let response = self
            .http
            .get(self.url(&format!("/api/quotes/{quote_id}/offer")))
            .send()
            .await
            .map_err(|e| SyncError::Transport(e.to_string()))?;
        Self::check(response)
            .await?
            .text()
            .await
            .map_err(|e| SyncError::Decode(e.to_string()))
    }
}

#[async_trait::async_trait]
impl QuoteSync for HttpQuoteSync {
    async fn create_quote(&self) -> Result<QuoteDetail, SyncError> {
        self.post_json("/api/quotes", &serde_json::json!({})).await
    }

    async fn fetch_quote(&self, quote_id: Uuid) -> Result<QuoteDetail, SyncError> {
        self.get_json(&format!("/api/quotes/{quote_id}")).await
    }

    async fn upload_image(
        &self,
        quote_id: Uuid,
        file_name: &str,
        bytes: &[u8],
    ) -> Result<String, SyncError> {
        let part = reqwest::multipart::Part::bytes(bytes.to_vec()).file_name(file_name.to_owned());
        let form = reqwest::multipart::Form::new().part("image", part);
        let response = self
            .http
            .post(self.url(&format!("/api/quotes/{quote_id}/upload")))
            .multipart(form)
            .send()
            .await
            .map_err(|e| SyncError::Transport(e.to_string()))?;
        let body: serde_json::Value = Self::check(response)
            .await?
            .json()
            .await
            .map_err(|e| SyncError::Decode(e.to_string()))?;
        body.get("image_url")
            .and_then(|v| v.as_str())
            .map(str::to_owned)
            .ok_or_else(|| SyncError::Decode("upload response missing image_url".to_owned()))
    }

    async fn process_extraction(&self, quote_id: Uuid) -> Result<(), SyncError> {
        let _: serde_json::Value = self
            .post_json(&format!("/api/quotes/{quote_id}/process"), &serde_json::json!({}))
            .await?;
        Ok(())
    }

    async fn save_dimensions(
        &self,
        quote_id: Uuid,
        update: &DimensionUpdate,
    ) -> Result<(), SyncError> {
        let response = self
            .http
            .patch(self.url(&format!("/api/quotes/{quote_id}/dimensions")))
            .json(update)
            .send()
            .await
            .map_err(|e| SyncError::Transport(e.to_string()))?;
        Self::check(response).await?;
        Ok(())
    }

    async fn save_obstacles(
        &self,
        quote_id: Uuid,
        obstacles: &[ObstacleEntry],
    ) -> Result<(), SyncError> {
        let response = self
            .http
            .patch(self.url(&format!("/api/quotes/{quote_id}/obstacles")))
            .json(&serde_json::json!({ "obstacles": obstacles }))
            .send()
            .await
            .map_err(|e| SyncError::Transport(e.to_string()))?;
        Self::check(response).await?;
        Ok(())
    }

    async fn calculate(
        &self,
        quote_id: Uuid,
        material_id: i64,
    ) -> Result<CalculationResult, SyncError> {
        self.post_json(
            &format!("/api/quotes/{quote_id}/calculate"),
            &serde_json::json!({ "material_id": material_id }),
        )
        .await
    }

    async fn generate_offer(
        &self,
        quote_id: Uuid,
        client: &ClientDetails,
    ) -> Result<DocumentRef, SyncError> {
        let response = self
            .http
            .post(self.url(&format!("/api/quotes/{quote_id}/offer")))
            .json(client)
            .send()
            .await
            .map_err(|e| SyncError::Transport(e.to_string()))?;
        Self::check(response)
            .await?
            .json()
            .await
            .map_err(|e| SyncError::Decode(e.to_string()))
    }
}

// =============================================================================
// COMMANDS
// =============================================================================

async fn run_materials_list(sync: &HttpQuoteSync) -> Result<(), CliError> {
    let materials = sync.list_materials().await?;
    println!("{:<4} {:<22} {:<12} {:>10} {:>7}", "id", "name", "category", "per m²", "waste");
    for material in materials {
        println!(
            "{:<4} {:<22} {:<12} {:>10} {:>7}",
            material.id,
            material.name,
            material.category.as_str(),
            material.price_per_m2,
            material.waste_factor,
        );
    }
    Ok(())
}

async fn run_quote_list(sync: &HttpQuoteSync) -> Result<(), CliError> {
    let quotes = sync.list_quotes().await?;
    println!("{:<14} {:<10} {:<20} {:<8} {:>10} {:>12}", "number", "status", "client", "roof", "area m²", "gross");
    for quote in quotes {
        println!(
            "{:<14} {:<10} {:<20} {:<8} {:>10} {:>12}",
            quote.number,
            quote.status.as_str(),
            quote.client_name,
            quote.roof_type.as_str(),
            quote.real_area.map_or_else(|| "-".to_owned(), |area| format!("{area:.1}")),
            quote.total_gross.map_or_else(|| "-".to_owned(), |gross| gross.to_string()),
        );
    }
    Ok(())
}

fn print_detail(detail: &QuoteDetail) -> Result<(), CliError> {
    println!("{}", serde_json::to_string_pretty(detail)?);
    Ok(())
}

fn parse_roof_type(raw: &str) -> Result<RoofType, CliError> {
    RoofType::from_str(raw).ok_or_else(|| CliError::InvalidRoofType(raw.to_owned()))
}

fn stage_banner(stage: Stage) {
    println!("── stage {}: {stage:?}", stage.number());
}

async fn run_wizard(sync: &HttpQuoteSync, args: RunArgs) -> Result<(), CliError> {
    let mut wizard = Wizard::new();

    // Stage 1: upload.
    stage_banner(wizard.stage());
    let bytes = tokio::fs::read(&args.image)
        .await
        .map_err(|source| CliError::ReadImage { path: args.image.clone(), source })?;
    let file_name = args
        .image
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("plan.jpg");
    wizard.select_image(file_name, bytes)?;
    println!("uploading {file_name} and running extraction...");
    wizard.upload_and_process(sync).await?;

    // Stage 3: verification.
    stage_banner(wizard.stage());
    let snapshot = wizard.snapshot();
    let number = snapshot.identity.as_ref().map_or("?", |identity| identity.number.as_str());
    println!("quote {number}");
    println!(
        "extracted: {} x {} m, pitch {}°, {} roof",
        snapshot.dimensions.length,
        snapshot.dimensions.width,
        snapshot.pitch_deg,
        snapshot.roof_type.as_str(),
    );
    if let Some(confidence) = snapshot.ai_confidence {
        println!("extraction confidence: {confidence:.1}");
    }

    if args.length.is_some() || args.width.is_some() {
        let dimensions = Dimensions::new(
            args.length.unwrap_or(wizard.snapshot().dimensions.length),
            args.width.unwrap_or(wizard.snapshot().dimensions.width),
        );
        wizard.set_dimensions(dimensions)?;
    }
    if let Some(pitch) = args.pitch {
        wizard.set_pitch(pitch)?;
    }
    if let Some(roof_type) = args.roof_type.as_deref() {
        wizard.set_roof_type(parse_roof_type(roof_type)?)?;
    }
    println!(
        "verified: {} x {} m → plan {:.1} m², roof {:.1} m²",
        wizard.snapshot().dimensions.length,
        wizard.snapshot().dimensions.width,
        wizard.plan_area(),
        wizard.real_area()?,
    );
    wizard.save_verification(sync).await?;

    // Stage 4: material.
    stage_banner(wizard.stage());
    let materials = sync.list_materials().await?;
    let material = match args.material {
        Some(id) => materials
            .into_iter()
            .find(|material| material.id == id)
            .ok_or(CliError::UnknownMaterial(id))?,
        None => materials.into_iter().next().ok_or(CliError::EmptyCatalog)?,
    };
    println!("material: {} ({} / m²)", material.name, material.price_per_m2);
    wizard.set_material(material)?;

    // Stage 5: calculation.
    wizard.calculate(sync).await?;
    stage_banner(wizard.stage());
    if let Some(calculation) = &wizard.snapshot().calculation {
        print_calculation(calculation);
    }
    wizard.next_step()?;

    // Stage 6: client + offer.
    stage_banner(wizard.stage());
    wizard.set_client(ClientDetails {
        name: args.client_name,
        email: args.client_email,
        phone: args.client_phone,
        address: args.client_address,
    })?;
    wizard.generate_offer(sync).await?;
    if let Some(offer) = wizard.snapshot().offer.as_ref() {
        println!("offer generated: {}", offer.url);
    }

    if let Some(quote_id) = wizard.snapshot().id() {
        let body = sync.fetch_offer_body(quote_id).await?;
        println!("\n{body}");
    }
    Ok(())
}

fn print_calculation(calculation: &CalculationResult) {
    println!(
        "plan {:.1} m² / roof surface {:.1} m²",
        calculation.plan_area, calculation.real_area
    );
    println!("{:<42} {:>10} {:>5} {:>12}", "item", "qty", "unit", "total");
    for item in calculation.materials.values() {
        println!(
            "{:<42} {:>10} {:>5} {:>12}",
            item.name, item.quantity, item.unit, item.total
        );
    }
    let summary = &calculation.summary;
    println!("materials net {}  labor {}  vat {}  gross {}",
        summary.materials_net, summary.labor_net, summary.vat, summary.total_gross);
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let sync = HttpQuoteSync::new(&cli.base_url);

    let result = match cli.command {
        Command::Materials(MaterialsCommand { command: MaterialsSubcommand::List }) => {
            run_materials_list(&sync).await
        }
        Command::Quote(QuoteCommand { command }) => match command {
            QuoteSubcommand::List => run_quote_list(&sync).await,
            QuoteSubcommand::Create => match sync.create_quote().await {
                Ok(detail) => print_detail(&detail),
                Err(err) => Err(err.into()),
            },
            QuoteSubcommand::Show { id } => match sync.fetch_quote(id).await {
                Ok(detail) => print_detail(&detail),
                Err(err) => Err(err.into()),
            },
            QuoteSubcommand::Duplicate { id } => match sync.duplicate_quote(id).await {
                Ok(detail) => print_detail(&detail),
                Err(err) => Err(err.into()),
            },
            QuoteSubcommand::Offer { id } => match sync.fetch_offer_body(id).await {
                Ok(body) => {
                    println!("{body}");
                    Ok(())
                }
                Err(err) => Err(err.into()),
            },
        },
        Command::Wizard(WizardCommand { command: WizardSubcommand::Run(args) }) => {
            run_wizard(&sync, args).await
        }
    };

    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
