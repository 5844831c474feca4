use std::{sync::Arc, time::Duration};

use anyhow::{Context, Result};
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};

use client_core::{
    ControllerEvent, DashboardBackend, DashboardController, HttpBackend, UiAction, ViewAnchor,
    ViewState, ViewTree,
};
use shared::protocol::{NewReading, ReadingPeriod};

mod commands;
mod settings;

use commands::ConsoleCommand;
use settings::Settings;

#[derive(Parser, Debug)]
struct Args {
    /// KPI service base URL.
    #[arg(long)]
    server_url: Option<String>,
    /// Seconds between scheduled dashboard refreshes.
    #[arg(long)]
    poll_secs: Option<u64>,
    /// Department filter applied to the KPI list at startup.
    #[arg(long)]
    department: Option<String>,
    /// Fetch and print the dashboard once, then exit.
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().init();
    let args = Args::parse();

    let mut settings = settings::load_settings();
    if let Some(url) = args.server_url {
        settings.server_url = url;
    }
    if let Some(secs) = args.poll_secs {
        settings.poll_period_secs = secs;
    }

    let backend = Arc::new(
        HttpBackend::new(&settings.server_url)
            .with_context(|| format!("invalid server url: {}", settings.server_url))?,
    );
    let controller = DashboardController::new(backend.clone(), ViewTree::full());

    controller.refresh_dashboard().await;
    match args.department {
        Some(department) => controller.set_filter(&department).await,
        None => controller.refresh_kpi_list().await,
    }
    print_regions(&controller).await;
    if args.once {
        return Ok(());
    }

    let mut events = controller.subscribe_events();
    controller
        .start_polling(Duration::from_secs(settings.poll_period_secs))
        .await;
    println!("{}", commands::USAGE);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(event) => handle_event(&controller, event).await,
                Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "event stream lagged");
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            },
            line = lines.next_line() => {
                let Some(line) = line.context("reading console input")? else {
                    break;
                };
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                match commands::parse(line) {
                    Ok(ConsoleCommand::Quit) => break,
                    Ok(command) => {
                        run_command(&controller, backend.as_ref(), &settings, command).await;
                    }
                    Err(message) => println!("{message}"),
                }
            }
        }
    }

    controller.shutdown().await;
    Ok(())
}

async fn run_command(
    controller: &DashboardController,
    backend: &HttpBackend,
    settings: &Settings,
    command: ConsoleCommand,
) {
    match command {
        ConsoleCommand::Refresh => controller.dispatch(UiAction::RefreshDashboard).await,
        ConsoleCommand::Filter { value } => {
            controller.dispatch(UiAction::SetFilter { value }).await;
        }
        ConsoleCommand::Departments => match backend.fetch_departments().await {
            Ok(departments) if departments.is_empty() => println!("no departments defined"),
            Ok(departments) => {
                for department in departments {
                    println!(
                        "{:>4}  {} ({} KPIs)",
                        department.id.0, department.name, department.kpi_count
                    );
                }
            }
            Err(err) => println!("department listing failed: {err}"),
        },
        ConsoleCommand::Submit {
            kpi_id,
            value,
            target,
        } => {
            let reading = NewReading {
                value,
                target,
                period: ReadingPeriod::Daily,
                notes: None,
                created_by: settings.created_by.clone(),
            };
            controller
                .dispatch(UiAction::SubmitReading { kpi_id, reading })
                .await;
        }
        ConsoleCommand::Show => print_regions(controller).await,
        ConsoleCommand::Help => println!("{}", commands::USAGE),
        ConsoleCommand::Quit => {}
    }
}

async fn handle_event(controller: &DashboardController, event: ControllerEvent) {
    match event {
        ControllerEvent::StateChanged(ViewState::Loading) => println!("loading..."),
        ControllerEvent::StateChanged(ViewState::Success) => println!("up to date"),
        ControllerEvent::StateChanged(ViewState::Error(message)) => println!("error: {message}"),
        ControllerEvent::ViewUpdated(anchors) => {
            for anchor in anchors {
                if let Some(content) = controller.region(anchor).await {
                    println!("#{}", anchor.element_id());
                    println!("{content}");
                }
            }
        }
        ControllerEvent::FilterChanged(filter) => println!("filter: {filter}"),
        ControllerEvent::ReadingAccepted { kpi_id } => {
            println!("reading accepted for kpi {}", kpi_id.0);
        }
        ControllerEvent::BulkAccepted { created } => {
            println!("bulk accepted: {created} readings");
        }
    }
}

async fn print_regions(controller: &DashboardController) {
    for anchor in ViewAnchor::ALL {
        if let Some(content) = controller.region(anchor).await {
            if content.is_empty() {
                continue;
            }
            println!("#{}", anchor.element_id());
            println!("{content}");
        }
    }
}
