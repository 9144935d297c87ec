//! Proposal data: what a sales rep configured, the priced breakdown supplied
//! by the pricing service, and the compact link encoding that carries a
//! configuration in a URL.

pub mod content;
pub mod template;

use crate::{Error, PageFooter, Result};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

pub use template::render_proposal_html;

/// Number of leading characters of the encoded link used as the proposal id
const ID_LEN: usize = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Agent {
    Seo,
    PaidAds,
    Website,
}

/// A line in a priced breakdown; SEO and paid ads may be sold as a bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PricedService {
    Seo,
    PaidAds,
    Website,
    SeoPaidCombo,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Template {
    Leads,
    Ecom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContractTerm {
    Annual,
    BiAnnual,
    Quarterly,
    Monthly,
}

impl ContractTerm {
    pub fn display_name(self) -> &'static str {
        match self {
            ContractTerm::Annual => "Annual",
            ContractTerm::BiAnnual => "Bi-Annual",
            ContractTerm::Quarterly => "Quarterly",
            ContractTerm::Monthly => "Monthly",
        }
    }

    pub fn months(self) -> u32 {
        match self {
            ContractTerm::Annual => 12,
            ContractTerm::BiAnnual => 6,
            ContractTerm::Quarterly => 3,
            ContractTerm::Monthly => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TermOption {
    #[serde(rename = "t")]
    pub term: ContractTerm,
    #[serde(rename = "d", default)]
    pub discount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposalConfig {
    pub id: String,
    pub customer_name: String,
    pub company_name: String,
    pub template: Template,
    pub selected_agents: Vec<Agent>,
    pub contract_term: ContractTerm,
    pub discount_percentage: Option<f64>,
    pub selected_terms: Vec<TermOption>,
    pub sales_rep_name: String,
    pub sales_rep_email: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentPrice {
    pub agent: PricedService,
    pub name: String,
    pub base_price: f64,
    pub final_price: f64,
}

/// Pricing computed upstream; read-only here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingBreakdown {
    pub agents: Vec<AgentPrice>,
    pub subtotal: f64,
    pub discount_amount: f64,
    pub total: f64,
    /// Monthly total times term months, after discount
    pub upfront_total: f64,
    pub term_months: u32,
    pub term: ContractTerm,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Proposal {
    pub config: ProposalConfig,
    pub pricing: PricingBreakdown,
}

impl Proposal {
    /// Subject used for the download filename
    pub fn subject(&self) -> &str {
        &self.config.company_name
    }

    /// Footer stamped on each page of the exported proposal
    pub fn page_footer(&self) -> PageFooter {
        PageFooter::new(content::FOOTER_BRAND)
    }
}

/// Wire form of a configuration; short keys keep links compact.
#[derive(Debug, Serialize, Deserialize)]
struct Payload {
    cn: String,
    co: String,
    t: Template,
    a: Vec<Agent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    ct: Option<ContractTerm>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    d: Option<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    st: Vec<TermOption>,
    sr: String,
    se: String,
    ts: i64,
}

/// Encode a configuration as unpadded base64url JSON.
pub fn encode_proposal(config: &ProposalConfig) -> Result<String> {
    let payload = Payload {
        cn: config.customer_name.clone(),
        co: config.company_name.clone(),
        t: config.template,
        a: config.selected_agents.clone(),
        ct: Some(config.contract_term),
        d: Some(config.discount_percentage.unwrap_or(0.0)),
        st: config.selected_terms.clone(),
        sr: config.sales_rep_name.clone(),
        se: config.sales_rep_email.clone(),
        ts: config.created_at.timestamp_millis(),
    };
    let json = serde_json::to_vec(&payload).map_err(|e| Error::Other(e.to_string()))?;
    Ok(URL_SAFE_NO_PAD.encode(json))
}

/// Decode a link produced by [`encode_proposal`].
///
/// Padding and the standard base64 alphabet are tolerated. A missing contract
/// term falls back to the first selected term option, then to monthly.
pub fn decode_proposal(encoded: &str) -> Result<ProposalConfig> {
    let normalised: String = encoded
        .trim()
        .trim_end_matches('=')
        .chars()
        .map(|c| match c {
            '+' => '-',
            '/' => '_',
            c => c,
        })
        .collect();
    if normalised.is_empty() {
        return Err(Error::InvalidProposal("empty proposal id".into()));
    }
    let json = URL_SAFE_NO_PAD
        .decode(normalised.as_bytes())
        .map_err(|e| Error::InvalidProposal(format!("not base64url: {}", e)))?;
    let payload: Payload = serde_json::from_slice(&json)
        .map_err(|e| Error::InvalidProposal(format!("malformed payload: {}", e)))?;
    let created_at = Utc
        .timestamp_millis_opt(payload.ts)
        .single()
        .ok_or_else(|| Error::InvalidProposal(format!("timestamp out of range: {}", payload.ts)))?;

    let contract_term = payload
        .ct
        .or_else(|| payload.st.first().map(|o| o.term))
        .unwrap_or(ContractTerm::Monthly);

    Ok(ProposalConfig {
        id: normalised.chars().take(ID_LEN).collect(),
        customer_name: payload.cn,
        company_name: payload.co,
        template: payload.t,
        selected_agents: payload.a,
        contract_term,
        discount_percentage: payload.d.filter(|d| *d != 0.0),
        selected_terms: payload.st,
        sales_rep_name: payload.sr,
        sales_rep_email: payload.se,
        created_at,
    })
}

/// Whole dollars with thousands separators, e.g. `$12,500`.
pub fn format_price(amount: f64) -> String {
    let rounded = amount.round();
    let digits = format!("{}", rounded.abs() as u64);
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if rounded < 0.0 {
        format!("-${}", grouped)
    } else {
        format!("${}", grouped)
    }
}
