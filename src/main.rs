use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use axum_prometheus::PrometheusMetricLayer;
use chrono::{Duration, Utc};
use clap::{Args, Parser, Subcommand};
use metrics_exporter_prometheus::PrometheusHandle;
use org_roster::config::AppConfig;
use org_roster::error::AppError;
use org_roster::telemetry;
use org_roster::workflows::roster::{
    roster_router, Actor, ApprovalBatch, CascadeStep, Department, DepartmentId, DepartmentStatus,
    DisapprovalOutcome, Employee, EmployeeId, InMemoryRoster, LevelId, Position, PositionId,
    PositionNode, RosterService, TypeId, UnassignCascade,
};
use serde_json::json;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
struct AppState {
    readiness: Arc<AtomicBool>,
    metrics: PrometheusHandle,
}

#[derive(Parser, Debug)]
#[command(
    name = "Department Roster Engine",
    about = "Run the roster approval service or walk through the approval lifecycle from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Roster lifecycle utilities
    Roster {
        #[command(subcommand)]
        command: RosterCommand,
    },
}

#[derive(Args, Debug, Default)]
struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    port: Option<u16>,
}

#[derive(Subcommand, Debug)]
enum RosterCommand {
    /// Walk a seeded department through approval, a blocked disapproval,
    /// the unassign cascade, and two structure versions
    Demo,
}

#[tokio::main]
async fn main() {
    if let Err(err) = run_cli().await {
        eprintln!("application error: {err}");
        std::process::exit(1);
    }
}

async fn run_cli() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => run_server(args).await,
        Command::Roster {
            command: RosterCommand::Demo,
        } => run_roster_demo(),
    }
}

type DemoService =
    RosterService<InMemoryRoster, InMemoryRoster, InMemoryRoster, InMemoryRoster, InMemoryRoster>;

fn demo_service() -> DemoService {
    let store = InMemoryRoster::new();
    seed_demo_roster(&store);
    let shared = Arc::new(store);
    RosterService::new(
        shared.clone(),
        shared.clone(),
        shared.clone(),
        shared.clone(),
        shared,
    )
}

fn seed_demo_roster(store: &InMemoryRoster) {
    let dept = DepartmentId("dept-finance".to_string());
    store.seed_department(Department {
        id: dept.clone(),
        name: "Finance".to_string(),
        code: "FIN".to_string(),
        vision: "Steward the company's resources".to_string(),
        description: "Accounting, payroll, and planning".to_string(),
        type_id: Some(TypeId("type-core".to_string())),
        parent_id: None,
        color: "#336699".to_string(),
        status: DepartmentStatus::Active,
        draft: None,
    });
    store.seed_type(TypeId("type-core".to_string()), "Core Function");
    store.seed_level(LevelId("level-director".to_string()), "Director");
    store.seed_level(LevelId("level-senior".to_string()), "Senior");
    store.seed_level(LevelId("level-associate".to_string()), "Associate");

    let mut head = Position::new(
        PositionId("pos-fin-head".to_string()),
        dept.clone(),
        "Head of Finance",
    );
    head.level_id = Some(LevelId("level-director".to_string()));

    let mut controller = Position::new(
        PositionId("pos-fin-controller".to_string()),
        dept.clone(),
        "Financial Controller",
    );
    controller.reports_to = Some(head.id.clone());
    controller.level_id = Some(LevelId("level-senior".to_string()));
    controller.filled = 2;

    let mut analyst = Position::new(
        PositionId("pos-fin-analyst".to_string()),
        dept.clone(),
        "Financial Analyst",
    );
    analyst.reports_to = Some(controller.id.clone());
    analyst.level_id = Some(LevelId("level-associate".to_string()));

    store.seed_position(head);
    store.seed_position(controller.clone());
    store.seed_position(analyst);

    for (n, (first, last)) in [("Maren", "Ostrander"), ("Jules", "Whitfield")]
        .into_iter()
        .enumerate()
    {
        store.seed_employee(Employee {
            id: EmployeeId(format!("emp-{:03}", n + 1)),
            position_id: Some(controller.id.clone()),
            department_id: Some(dept.clone()),
            first_name: first.to_string(),
            last_name: last.to_string(),
            employee_code: format!("FIN-{:03}", n + 1),
        });
    }
}

async fn run_server(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let state = AppState {
        readiness: readiness_flag.clone(),
        metrics: prometheus_handle,
    };

    // The serve path runs against the seeded in-memory store; a persistent
    // deployment swaps in stores backed by the real registry and directory.
    let service = Arc::new(demo_service());

    let app = Router::new()
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .with_state(state)
        .merge(roster_router(service))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "roster approval service ready");

    axum::serve(listener, app).await?;
    Ok(())
}

fn run_roster_demo() -> Result<(), AppError> {
    let service = demo_service();
    let dept = DepartmentId("dept-finance".to_string());
    let actor = Actor {
        id: "user-demo".to_string(),
        display_name: "Demo Operator".to_string(),
    };
    let t1 = Utc::now();

    let all_positions: Vec<PositionId> = service
        .department_positions(&dept)?
        .into_iter()
        .map(|p| p.id)
        .collect();

    let approved = service.approve_positions(&ApprovalBatch {
        department_id: dept.clone(),
        position_ids: all_positions,
        at: t1,
        note: Some("initial structure sign-off".to_string()),
        actor: actor.clone(),
    })?;
    println!("approved {} positions", approved.len());

    let first = service.approve_structure(&dept, t1)?;
    println!(
        "structure version {} created ({} positions)",
        first.version_id.0, first.position_count
    );

    // A disapproval of the filled controller slot blocks on its two
    // assigned employees and drives the cascade.
    let disapprove = ApprovalBatch {
        department_id: dept.clone(),
        position_ids: vec![PositionId("pos-fin-controller".to_string())],
        at: t1 + Duration::hours(1),
        note: Some("rescoping the controller role".to_string()),
        actor,
    };
    match service.disapprove_positions(&disapprove)? {
        DisapprovalOutcome::Applied { .. } => println!("disapproval applied immediately"),
        DisapprovalOutcome::Blocked { queue } => {
            println!("disapproval blocked by {} employee(s)", queue.len());
            let mut cascade = UnassignCascade::new(disapprove, queue);
            loop {
                match cascade.advance(&service).map_err(approval_io)? {
                    CascadeStep::AwaitingConfirmation { unassigned, .. } => {
                        println!(
                            "  unassigned {} ({} cleared, {} remaining)",
                            unassigned.0,
                            cascade.processed(),
                            cascade.remaining()
                        );
                    }
                    CascadeStep::Completed {
                        unassigned,
                        outcome,
                    } => {
                        println!("  cascade done after {unassigned} unassignment(s)");
                        if let DisapprovalOutcome::Applied { positions } = outcome {
                            for position in positions {
                                println!("  disapproved {}", position.0);
                            }
                        }
                        break;
                    }
                }
            }
        }
    }

    let report = service.sync_filled_counts(&dept)?;
    println!("reconciliation corrected {} position(s)", report.corrected);

    println!("\nreporting lines:");
    for root in service.structure_tree(&dept)? {
        render_node(&root, 1);
    }

    println!("\naudit trail:");
    for position in service.department_positions(&dept)? {
        for entry in &position.approval_history {
            println!(
                "  {}: {} by {} at {}",
                position.title,
                entry.action.label(),
                entry.actor_name,
                entry.at
            );
        }
    }

    println!("\nversion history:");
    for version in service.structure_versions(&dept)? {
        let window = match version.valid_to {
            Some(end) => format!("{} .. {}", version.approved_at, end),
            None => format!("{} .. (current)", version.approved_at),
        };
        let type_name = version.type_name.as_deref().unwrap_or("untyped");
        println!("  {} [{type_name}]: {window}", version.id.0);
    }

    Ok(())
}

fn approval_io(err: org_roster::workflows::roster::CascadeError) -> AppError {
    use org_roster::workflows::roster::CascadeError;
    match err {
        CascadeError::Approval(inner) => AppError::Approval(inner),
        CascadeError::Repository(inner) => AppError::Repository(inner),
        CascadeError::AlreadyCompleted => {
            AppError::Io(std::io::Error::other("cascade already completed"))
        }
    }
}

fn render_node(node: &PositionNode, depth: usize) {
    println!(
        "{}- {} (filled {})",
        "  ".repeat(depth),
        node.position.title,
        node.position.filled
    );
    for child in &node.children {
        render_node(child, depth + 1);
    }
}

async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn readiness_endpoint(State(state): State<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

async fn metrics_endpoint(State(state): State<AppState>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}
