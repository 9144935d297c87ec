//! The proposal view as HTML, annotated with pagination markers.
//!
//! Every top-level section is one block. The investment summary always
//! starts on a fresh page.

use super::content::{executive_summary, service_scope, IMPLEMENTATION_TIMELINE, TIMELINE_INTRO};
use super::{format_price, Proposal};
use crate::rendering::layout::{BLOCK_MARKER, BREAK_MARKER};
use std::fmt::Write;

const BLUE: &str = "#2563eb";
const GRAY_50: &str = "#f9fafb";
const GRAY_200: &str = "#e5e7eb";
const GRAY_600: &str = "#4b5563";
const GRAY_700: &str = "#374151";
const GRAY_900: &str = "#111827";
const GREEN_600: &str = "#16a34a";
const BLUE_50: &str = "#eff6ff";
const BLUE_200: &str = "#bfdbfe";

pub fn render_proposal_html(proposal: &Proposal) -> String {
    let mut html = String::with_capacity(16 * 1024);
    header(&mut html, proposal);
    summary(&mut html, proposal);
    services(&mut html, proposal);
    for &agent in &proposal.config.selected_agents {
        let scope = service_scope(agent, proposal.config.template);
        let _ = write!(
            html,
            r#"<section {BLOCK_MARKER} style="padding: 24px 32px"><h2 style="color: {GRAY_900}">{} - Service Scope</h2><p style="color: {GRAY_700}; font-size: 18px">{}</p><div style="background: {GRAY_50}; padding: 24px"><h3 style="color: {GRAY_900}">Key Deliverables:</h3><ul>"#,
            escape(scope.title),
            escape(scope.description),
        );
        for item in scope.deliverables {
            let _ = write!(html, r#"<li style="color: {GRAY_700}">{}</li>"#, escape(item));
        }
        html.push_str("</ul></div></section>");
    }
    timeline(&mut html);
    investment(&mut html, proposal);
    html
}

fn header(html: &mut String, proposal: &Proposal) {
    let config = &proposal.config;
    let agents: Vec<&str> = config.selected_agents.iter().map(|a| a.title()).collect();
    let _ = write!(
        html,
        r#"<header {BLOCK_MARKER} style="padding: 32px; border-bottom: 4px solid {BLUE}"><h1 style="color: {BLUE}; font-size: 36px">MEGA</h1><h2 style="color: {GRAY_900}">Proposal</h2><p style="color: {GRAY_600}; font-size: 18px">{}</p><div style="color: {GRAY_600}; font-size: 14px; text-align: right"><p style="margin: 0">Prepared for: <strong>{}</strong></p><p style="margin: 0">Company: <strong>{}</strong></p><p style="margin: 0">Date: <strong>{}</strong></p><p style="margin: 0">Prepared by: <strong>{}</strong></p></div></header>"#,
        escape(&agents.join(" + ")),
        escape(&config.customer_name),
        escape(&config.company_name),
        config.created_at.format("%B %d, %Y"),
        escape(&config.sales_rep_name),
    );
}

fn summary(html: &mut String, proposal: &Proposal) {
    let _ = write!(
        html,
        r#"<section {BLOCK_MARKER} style="padding: 24px 32px"><div style="border-left: 4px solid {BLUE}; padding-left: 24px"><h2 style="color: {GRAY_900}">Executive Summary</h2><p style="color: {GRAY_700}; font-size: 18px; line-height: 1.6">{}</p></div></section>"#,
        escape(executive_summary(proposal.config.template)),
    );
}

fn services(html: &mut String, proposal: &Proposal) {
    let discounted = proposal.pricing.discount_amount > 0.0;
    let _ = write!(
        html,
        r#"<section {BLOCK_MARKER} style="padding: 24px 32px"><h2 style="color: {GRAY_900}">Selected Services</h2>"#
    );
    for line in &proposal.pricing.agents {
        let _ = write!(
            html,
            r#"<div style="background: {GRAY_50}; border: 1px solid {GRAY_200}; padding: 24px; margin-bottom: 24px"><h3 style="color: {BLUE}">{}</h3><p style="color: {GRAY_700}">{}</p>"#,
            escape(&line.name),
            escape(line.agent.short_description()),
        );
        if discounted {
            let _ = write!(
                html,
                r#"<p style="text-align: right; margin: 0; color: {GRAY_600}">was {}</p><p style="text-align: right; margin: 0; font-size: 24px; font-weight: bold; color: {GREEN_600}">{}</p>"#,
                format_price(line.base_price),
                format_price(line.final_price),
            );
        } else {
            let _ = write!(
                html,
                r#"<p style="text-align: right; margin: 0; font-size: 24px; font-weight: bold; color: {GRAY_900}">{}</p>"#,
                format_price(line.final_price),
            );
        }
        let _ = write!(html, r#"<p style="text-align: right; margin: 0; font-size: 14px; color: {GRAY_600}">per month</p></div>"#);
    }
    html.push_str("</section>");
}

fn timeline(html: &mut String) {
    let _ = write!(
        html,
        r#"<section {BLOCK_MARKER} style="padding: 24px 32px"><h2 style="color: {GRAY_900}">Implementation Timeline</h2><p style="color: {GRAY_700}; font-size: 18px">{}</p>"#,
        escape(TIMELINE_INTRO),
    );
    for (phase, tasks) in IMPLEMENTATION_TIMELINE {
        let _ = write!(
            html,
            r#"<div style="background: {GRAY_50}; border: 1px solid {GRAY_200}; padding: 24px; margin-bottom: 16px"><h3 style="color: {BLUE}">{}</h3><ul>"#,
            escape(phase),
        );
        for task in tasks.iter() {
            let _ = write!(html, r#"<li style="color: {GRAY_700}; font-size: 14px">{}</li>"#, escape(task));
        }
        html.push_str("</ul></div>");
    }
    html.push_str("</section>");
}

fn investment(html: &mut String, proposal: &Proposal) {
    let pricing = &proposal.pricing;
    let term = proposal.config.contract_term.display_name();
    let discounted = pricing.discount_amount > 0.0;
    let _ = write!(
        html,
        r#"<section {BLOCK_MARKER} {BREAK_MARKER} style="padding: 24px 32px"><h2 style="color: {GRAY_900}">Investment Summary</h2><div style="background: {BLUE_50}; border: 1px solid {BLUE_200}; padding: 32px">"#
    );
    for line in &pricing.agents {
        let _ = write!(
            html,
            r#"<div style="border-bottom: 1px solid {BLUE_200}; padding-bottom: 16px; margin-bottom: 16px"><h3 style="color: {GRAY_900}; margin: 0">{}</h3><p style="color: {GRAY_600}; font-size: 14px; margin: 0">{} billing</p>"#,
            escape(&line.name),
            term,
        );
        if discounted {
            let _ = write!(
                html,
                r#"<p style="text-align: right; margin: 0; color: {GRAY_600}">was {}/mo</p><p style="text-align: right; margin: 0; font-size: 24px; font-weight: bold; color: {GREEN_600}">{}/mo</p>"#,
                format_price(line.base_price),
                format_price(line.final_price),
            );
        } else {
            let _ = write!(
                html,
                r#"<p style="text-align: right; margin: 0; font-size: 24px; font-weight: bold; color: {GRAY_900}">{}/mo</p>"#,
                format_price(line.final_price),
            );
        }
        html.push_str("</div>");
    }

    let _ = write!(
        html,
        r#"<div style="background: #ffffff; border: 1px solid {BLUE_200}; padding: 24px"><h3 style="color: {GRAY_900}; margin: 0">Monthly Rate</h3><p style="color: {GRAY_600}; margin: 0">{} commitment</p>"#,
        term,
    );
    if discounted {
        let _ = write!(
            html,
            r#"<p style="color: {GREEN_600}; font-weight: 600; margin: 0">Monthly savings: {}</p>"#,
            format_price(pricing.discount_amount),
        );
    }
    let _ = write!(
        html,
        r#"<p style="text-align: right; font-size: 30px; font-weight: bold; color: {BLUE}; margin: 0">{}/mo</p>"#,
        format_price(pricing.total),
    );
    if pricing.term_months > 1 {
        let _ = write!(
            html,
            r#"<div style="border-top: 1px solid {BLUE_200}; margin-top: 16px; padding-top: 16px"><h3 style="color: {GRAY_900}; margin: 0">Due Upfront</h3><p style="color: {GRAY_600}; margin: 0">{}/mo x {} months</p><p style="text-align: right; font-size: 30px; font-weight: bold; color: {BLUE}; margin: 0">{}</p></div>"#,
            format_price(pricing.total),
            pricing.term_months,
            format_price(pricing.upfront_total),
        );
    }
    html.push_str("</div></div></section>");
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}
