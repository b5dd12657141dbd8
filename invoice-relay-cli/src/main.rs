use std::process::Child;

use clap::Parser;
use invoice_relay::{
    ChromeRenderer, Dispatcher, DocumentRenderer, SinkStatus, error::AddContext, format_usd,
    process_submission, start_chromedriver,
};
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;

mod cli;

fn kill_chrome(chrome_process: &mut Child) -> Result<(), invoice_relay::Error> {
    chrome_process
        .kill()
        .map_err(invoice_relay::Error::from)
        .add_context("killing chromedriver process from cli")?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), invoice_relay::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let invoice = cli.get_form_input()?.into_invoice()?;
    println!(
        "Invoice {} | Subtotal: ${} | Tax ({}%): ${} | Total: ${}",
        invoice.invoice_number(),
        format_usd(invoice.financial().subtotal()),
        invoice.financial().tax_rate(),
        format_usd(invoice.financial().tax_amount()),
        format_usd(invoice.financial().total()),
    );

    let dispatcher =
        Dispatcher::from_config(&cli.delivery_config()).add_context("configuring sinks")?;

    let mut chrome_process = if cli.wants_document() {
        Some(start_chromedriver().add_context("starting chromedriver in cli")?)
    } else {
        None
    };

    let renderer = ChromeRenderer::new();
    let renderer_ref: Option<&dyn DocumentRenderer> = if cli.wants_document() {
        Some(&renderer)
    } else {
        None
    };
    let report = process_submission(invoice, renderer_ref, &dispatcher).await;

    if let Some(chrome) = chrome_process.as_mut() {
        kill_chrome(chrome)?;
    }

    if let Some(e) = &report.render_error {
        eprintln!("PDF generation failed: {e}");
    }
    for result in &report.results {
        match result.status {
            SinkStatus::Success => println!("{}: success - {}", result.sink_name, result.detail),
            SinkStatus::Failed => println!("{}: FAILED - {}", result.sink_name, result.detail),
            SinkStatus::Skipped => println!("{}: skipped - {}", result.sink_name, result.detail),
        }
    }

    if cli.print_json {
        let json = serde_json::to_string_pretty(&report.invoice)
            .map_err(invoice_relay::Error::from)
            .add_context("serializing invoice record for display")?;
        println!("{json}");
    }

    Ok(())
}
