//! Static proposal copy.

use super::{Agent, PricedService, Template};

/// What a service delivers under a given template
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ServiceScope {
    pub title: &'static str,
    pub description: &'static str,
    pub deliverables: &'static [&'static str],
}

pub const COMBO_DESCRIPTION: &str =
    "AI-powered SEO, GEO optimization, and intelligent paid advertising, bundled for maximum impact.";

/// Brand line in the footer of every proposal page
pub const FOOTER_BRAND: &str = "MEGA AI  \u{2022}  gomega.ai";

pub const TIMELINE_INTRO: &str =
    "Our proven 90-day implementation roadmap ensures rapid deployment and measurable results.";

impl Agent {
    pub fn title(self) -> &'static str {
        match self {
            Agent::Seo => "SEO & GEO Agent",
            Agent::PaidAds => "Paid Ads Agent",
            Agent::Website => "Website Agent",
        }
    }

    pub fn short_description(self) -> &'static str {
        match self {
            Agent::Seo => "Dominate search results with AI-powered SEO and GEO strategies",
            Agent::PaidAds => "Maximize ROI with intelligent paid advertising automation",
            Agent::Website => "Custom AI-optimized websites built for conversion",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Agent::Seo => "Our SEO & GEO Agent leverages cutting-edge AI technology to optimize your digital presence across search engines and local geo-locations, driving qualified traffic and improving your online visibility.",
            Agent::PaidAds => "AI-driven paid advertising campaigns designed to optimize performance and maximize your return on investment across all major platforms.",
            Agent::Website => "Professional website development with AI optimization, designed for maximum conversion and seamless integration with your marketing ecosystem.",
        }
    }
}

impl PricedService {
    pub fn short_description(self) -> &'static str {
        match self {
            PricedService::Seo => Agent::Seo.short_description(),
            PricedService::PaidAds => Agent::PaidAds.short_description(),
            PricedService::Website => Agent::Website.short_description(),
            PricedService::SeoPaidCombo => COMBO_DESCRIPTION,
        }
    }
}

const SEO_DELIVERABLES: &[&str] = &[
    "20-25 SEO-optimized blog posts per month",
    "Comprehensive technical SEO audits",
    "AI LLM & GEO placement optimization",
    "Strategic link building campaigns",
    "Conversion rate optimization",
    "Local search optimization",
    "Keyword research and strategy",
    "Performance monitoring and reporting",
];

const PAID_ADS_LEADS_DELIVERABLES: &[&str] = &[
    "CPQL (Cost Per Qualified Lead) optimization",
    "CRM integration and lead tracking",
    "Lead scoring and quality assessment solutions",
    "Landing page A/B testing and optimization",
    "Advanced retargeting and remarketing campaigns",
    "Multi-platform campaign management",
    "Real-time performance monitoring",
    "Monthly strategy reviews and optimizations",
];

const PAID_ADS_ECOM_DELIVERABLES: &[&str] = &[
    "ROAS & CAC optimization strategies",
    "Product feed setup and catalog integration",
    "Shopping & Dynamic ads implementation",
    "Cart abandonment retargeting campaigns",
    "Purchase event tracking and optimization",
    "Multi-channel campaign coordination",
    "Revenue attribution modeling",
    "Monthly performance analysis and reporting",
];

const WEBSITE_DELIVERABLES: &[&str] = &[
    "Custom website design and development",
    "SEO & Ads ready setup and optimization",
    "Comprehensive analytics dashboard",
    "Unlimited changes with 2-day turnaround",
    "Secure hosting and SSL certification",
    "GDPR and compliance management",
    "Mobile-responsive design",
    "Performance optimization and monitoring",
];

pub fn service_scope(agent: Agent, template: Template) -> ServiceScope {
    let deliverables = match (agent, template) {
        (Agent::Seo, _) => SEO_DELIVERABLES,
        (Agent::PaidAds, Template::Leads) => PAID_ADS_LEADS_DELIVERABLES,
        (Agent::PaidAds, Template::Ecom) => PAID_ADS_ECOM_DELIVERABLES,
        (Agent::Website, _) => WEBSITE_DELIVERABLES,
    };
    ServiceScope { title: agent.title(), description: agent.description(), deliverables }
}

pub fn executive_summary(template: Template) -> &'static str {
    match template {
        Template::Leads => "This proposal outlines a comprehensive AI-driven marketing strategy designed to generate high-quality leads for your business. Our approach combines cutting-edge SEO, intelligent paid advertising, and conversion optimization to create a powerful lead generation engine that delivers measurable results and sustainable growth.",
        Template::Ecom => "This proposal presents a complete AI-powered eCommerce marketing solution designed to maximize your online revenue and customer acquisition. Through advanced SEO strategies, targeted paid advertising, and conversion optimization, we'll create a comprehensive system that drives sales and builds lasting customer relationships.",
    }
}

/// Phases of the 90-day rollout, in order
pub const IMPLEMENTATION_TIMELINE: &[(&str, &[&str])] = &[
    (
        "Day 0-30",
        &[
            "Initial account setup and configuration",
            "Comprehensive audit of current digital presence",
            "Strategic planning and goal setting",
            "Campaign architecture development",
            "Initial content creation and optimization",
        ],
    ),
    (
        "Day 31-60",
        &[
            "Full campaign launch and monitoring",
            "A/B testing implementation and analysis",
            "Performance optimization based on initial data",
            "Audience refinement and targeting adjustments",
            "First month performance review and strategy refinement",
        ],
    ),
    (
        "Day 61-90",
        &[
            "Advanced optimization and scaling strategies",
            "Custom automation implementation",
            "Performance benchmarking and goal assessment",
            "Quarterly strategy review and planning",
            "ROI analysis and future recommendations",
        ],
    ),
    (
        "Ongoing",
        &[
            "Continuous monitoring and optimization",
            "Monthly performance reviews and reports",
            "Proactive strategy adjustments",
            "New opportunity identification",
            "24/7 account management and support",
        ],
    ),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paid_ads_scope_depends_on_template() {
        let leads = service_scope(Agent::PaidAds, Template::Leads);
        let ecom = service_scope(Agent::PaidAds, Template::Ecom);
        assert_eq!(leads.title, ecom.title);
        assert_ne!(leads.deliverables, ecom.deliverables);
        assert_eq!(service_scope(Agent::Seo, Template::Leads), service_scope(Agent::Seo, Template::Ecom));
    }

    #[test]
    fn timeline_has_four_phases() {
        assert_eq!(IMPLEMENTATION_TIMELINE.len(), 4);
        assert!(IMPLEMENTATION_TIMELINE.iter().all(|(_, items)| items.len() == 5));
    }
}
