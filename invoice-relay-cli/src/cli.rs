use std::{
    fs,
    io::{self, Read},
    path::PathBuf,
};

use bigdecimal::{BigDecimal, FromPrimitive};
use chrono::NaiveDate;
use clap::Parser;
use invoice_relay::{
    CloudConfig, Company, CustomerBuilder, DeliveryConfig, DownloadConfig, Invoice, InvoiceBuilder,
    LineItemBuilder, WebhookConfig, error::AddContext,
};
use serde::Deserialize;

fn read_until_eof() -> io::Result<String> {
    let mut input = String::new();
    io::stdin().read_to_string(&mut input)?;
    Ok(input)
}

#[derive(Debug, Parser)]
pub struct Cli {
    /// Path to the JSON file with the form input; stdin when omitted
    #[arg(short, long)]
    pub data: Option<PathBuf>,

    /// Directory where the rendered PDF should be saved
    #[arg(short, long)]
    pub out: Option<PathBuf>,

    /// Automation webhook URL to POST the invoice record to
    #[arg(long)]
    pub webhook_url: Option<String>,

    /// Embed the rendered PDF in the webhook payload
    #[arg(long)]
    pub attach_pdf: bool,

    /// Path to a service account key file for the cloud upload
    #[arg(long)]
    pub credentials: Option<PathBuf>,

    /// Destination folder id for the cloud upload
    #[arg(long)]
    pub folder_id: Option<String>,

    /// Skip PDF rendering entirely
    #[arg(long)]
    pub no_pdf: bool,

    /// Print the invoice record as JSON after dispatch
    #[arg(long)]
    pub print_json: bool,
}

/// Raw field values as collected by the form, before validation.
#[derive(Debug, Deserialize)]
pub struct FormInput {
    #[serde(default)]
    pub customer_name: String,
    #[serde(default)]
    pub customer_address: String,
    #[serde(default)]
    pub customer_email: String,
    #[serde(default)]
    pub customer_phone: String,
    pub product_type: String,
    #[serde(default = "default_quantity")]
    pub quantity: i32,
    pub price_per_unit: f64,
    #[serde(default)]
    pub tax_rate: f64,
    #[serde(default)]
    pub invoice_number: Option<String>,
    #[serde(default)]
    pub invoice_date: Option<NaiveDate>,
    #[serde(default)]
    pub company_name: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub sales_agent: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

fn default_quantity() -> i32 {
    1
}

impl FormInput {
    /// Validate and normalize the raw form fields into an [`Invoice`].
    pub fn into_invoice(self) -> Result<Invoice, invoice_relay::Error> {
        let customer = CustomerBuilder::default()
            .name(self.customer_name)
            .address(self.customer_address)
            .email(self.customer_email)
            .phone(self.customer_phone)
            .build()
            .add_context("validating customer fields")?;

        let price_per_unit = BigDecimal::from_f64(self.price_per_unit).ok_or_else(|| {
            invoice_relay::Error::from(format!(
                "price per unit is not a finite number: {}",
                self.price_per_unit
            ))
        })?;
        let tax_rate = BigDecimal::from_f64(self.tax_rate).ok_or_else(|| {
            invoice_relay::Error::from(format!(
                "tax rate is not a finite number: {}",
                self.tax_rate
            ))
        })?;

        let item = LineItemBuilder::default()
            .product_type(self.product_type)
            .quantity(self.quantity)
            .price_per_unit(price_per_unit)
            .build()
            .add_context("validating line item fields")?;

        let mut builder = InvoiceBuilder::default()
            .customer(customer)
            .add_line(item)
            .tax_rate(tax_rate);
        if let Some(number) = self.invoice_number {
            builder = builder.invoice_number(number);
        }
        if let Some(date) = self.invoice_date {
            builder = builder.invoice_date(date);
        }
        if self.company_name.is_some() || self.color.is_some() {
            let defaults = Company::default();
            builder = builder.company(Company::new(
                self.company_name.as_deref().unwrap_or(defaults.name()),
                self.color.as_deref().unwrap_or(defaults.color()),
            ));
        }
        if let Some(agent) = self.sales_agent {
            builder = builder.sales_agent(agent);
        }
        if let Some(notes) = self.notes {
            builder = builder.notes(notes);
        }
        builder.build().add_context("building invoice record")
    }
}

impl Cli {
    pub fn get_form_input(&self) -> Result<FormInput, invoice_relay::Error> {
        let raw = match &self.data {
            Some(path) => fs::read_to_string(path)
                .map_err(invoice_relay::Error::from)
                .add_context(&format!(
                    "reading form input from file '{}'",
                    path.to_str().unwrap_or("UNKNOWN")
                ))?,
            None => read_until_eof()
                .map_err(invoice_relay::Error::from)
                .add_context("reading form input from stdin")?,
        };

        serde_json::from_str(&raw)
            .map_err(invoice_relay::Error::from)
            .add_context("parsing form input JSON")
    }

    pub fn delivery_config(&self) -> DeliveryConfig {
        DeliveryConfig {
            webhook: self.webhook_url.clone().map(|url| WebhookConfig {
                url,
                attach_document: self.attach_pdf,
                enabled: true,
            }),
            cloud: match (&self.credentials, &self.folder_id) {
                (Some(credentials_path), Some(folder_id)) => Some(CloudConfig {
                    credentials_path: credentials_path.clone(),
                    folder_id: folder_id.clone(),
                    enabled: true,
                }),
                _ => None,
            },
            download: self.out.clone().map(|dir| DownloadConfig {
                dir,
                enabled: true,
            }),
        }
    }

    /// Whether this invocation needs a rendered document at all.
    pub fn wants_document(&self) -> bool {
        !self.no_pdf
    }
}
