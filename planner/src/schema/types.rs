use serde::{Deserialize, Serialize};

/// Top-level namespaces of the planner document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Namespace {
    Plan,
    Checklist,
    Templates,
    Financials,
    Calendar,
    DeepDive,
}

impl Namespace {
    pub const ALL: [Namespace; 6] = [
        Namespace::Plan,
        Namespace::Checklist,
        Namespace::Templates,
        Namespace::Financials,
        Namespace::Calendar,
        Namespace::DeepDive,
    ];

    /// Key of this namespace in the serialized document
    pub fn key(&self) -> &'static str {
        match self {
            Namespace::Plan => "plan",
            Namespace::Checklist => "checklist",
            Namespace::Templates => "templates",
            Namespace::Financials => "financials",
            Namespace::Calendar => "calendar",
            Namespace::DeepDive => "deepDive",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|ns| ns.key() == key)
    }
}

/// The typed roots a path segment can resolve to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Root {
    Version,
    LastModified,
    Namespace(Namespace),
    /// A top-level key the schema doesn't know about, kept for lossless round-trips
    Extra,
}

impl Root {
    pub fn resolve(segment: &str) -> Self {
        match segment {
            "version" => Root::Version,
            "lastModified" => Root::LastModified,
            other => Namespace::from_key(other)
                .map(Root::Namespace)
                .unwrap_or(Root::Extra),
        }
    }
}

/// Fields of one calendar row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CalendarField {
    TimeStart,
    TimeEnd,
    ActivityType,
    Description,
    Platform,
    ContentPillar,
    Status,
    Notes,
    /// Derived from start/end
    Duration,
}

impl CalendarField {
    /// Raw fields a user edits, in column order
    pub const INPUTS: [CalendarField; 8] = [
        CalendarField::TimeStart,
        CalendarField::TimeEnd,
        CalendarField::ActivityType,
        CalendarField::Description,
        CalendarField::Platform,
        CalendarField::ContentPillar,
        CalendarField::Status,
        CalendarField::Notes,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            CalendarField::TimeStart => "timeStart",
            CalendarField::TimeEnd => "timeEnd",
            CalendarField::ActivityType => "activityType",
            CalendarField::Description => "description",
            CalendarField::Platform => "platform",
            CalendarField::ContentPillar => "contentPillar",
            CalendarField::Status => "status",
            CalendarField::Notes => "notes",
            CalendarField::Duration => "duration",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::INPUTS
            .into_iter()
            .chain([CalendarField::Duration])
            .find(|field| field.key() == key)
    }
}

/// How a financial field participates in the monthly rollup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Metric,
    Revenue,
    Expense,
    Text,
    Derived,
}

/// Fields of one financial month record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FinancialField {
    AvgViewers,
    TotalFollowers,
    TotalSubscribers,
    SubRevenue,
    BitsRevenue,
    Donations,
    TwitchAds,
    YoutubeAdsense,
    Sponsorships,
    Merchandise,
    Affiliate,
    OtherRevenue,
    HardwareCosts,
    SoftwareCosts,
    LegalAdmin,
    ContractorCosts,
    MarketingCosts,
    OtherExpenses,
    Notes,
    TotalRevenue,
    TotalExpenses,
    NetProfit,
    CumulativeProfit,
}

impl FinancialField {
    pub const METRICS: [FinancialField; 3] = [
        FinancialField::AvgViewers,
        FinancialField::TotalFollowers,
        FinancialField::TotalSubscribers,
    ];

    pub const REVENUE: [FinancialField; 9] = [
        FinancialField::SubRevenue,
        FinancialField::BitsRevenue,
        FinancialField::Donations,
        FinancialField::TwitchAds,
        FinancialField::YoutubeAdsense,
        FinancialField::Sponsorships,
        FinancialField::Merchandise,
        FinancialField::Affiliate,
        FinancialField::OtherRevenue,
    ];

    pub const EXPENSES: [FinancialField; 6] = [
        FinancialField::HardwareCosts,
        FinancialField::SoftwareCosts,
        FinancialField::LegalAdmin,
        FinancialField::ContractorCosts,
        FinancialField::MarketingCosts,
        FinancialField::OtherExpenses,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            FinancialField::AvgViewers => "avgViewers",
            FinancialField::TotalFollowers => "totalFollowers",
            FinancialField::TotalSubscribers => "totalSubscribers",
            FinancialField::SubRevenue => "subRevenue",
            FinancialField::BitsRevenue => "bitsRevenue",
            FinancialField::Donations => "donations",
            FinancialField::TwitchAds => "twitchAds",
            FinancialField::YoutubeAdsense => "youtubeAdsense",
            FinancialField::Sponsorships => "sponsorships",
            FinancialField::Merchandise => "merchandise",
            FinancialField::Affiliate => "affiliate",
            FinancialField::OtherRevenue => "otherRevenue",
            FinancialField::HardwareCosts => "hardwareCosts",
            FinancialField::SoftwareCosts => "softwareCosts",
            FinancialField::LegalAdmin => "legalAdmin",
            FinancialField::ContractorCosts => "contractorCosts",
            FinancialField::MarketingCosts => "marketingCosts",
            FinancialField::OtherExpenses => "otherExpenses",
            FinancialField::Notes => "notes",
            FinancialField::TotalRevenue => "totalRevenue",
            FinancialField::TotalExpenses => "totalExpenses",
            FinancialField::NetProfit => "netProfit",
            FinancialField::CumulativeProfit => "cumulativeProfit",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::METRICS
            .into_iter()
            .chain(Self::REVENUE)
            .chain(Self::EXPENSES)
            .chain([
                FinancialField::Notes,
                FinancialField::TotalRevenue,
                FinancialField::TotalExpenses,
                FinancialField::NetProfit,
                FinancialField::CumulativeProfit,
            ])
            .find(|field| field.key() == key)
    }

    pub fn kind(&self) -> FieldKind {
        if Self::METRICS.contains(self) {
            FieldKind::Metric
        } else if Self::REVENUE.contains(self) {
            FieldKind::Revenue
        } else if Self::EXPENSES.contains(self) {
            FieldKind::Expense
        } else if *self == FinancialField::Notes {
            FieldKind::Text
        } else {
            FieldKind::Derived
        }
    }
}
