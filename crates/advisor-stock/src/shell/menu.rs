//! Numbered menus

/// Top-level menu entries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MainChoice {
    PortfolioAnalytics,
    AnalyzeStock,
    ManagePortfolio,
    RiskManagement,
    PriceAlerts,
    Exit,
}

impl MainChoice {
    pub const MENU: &'static str = "\nChoose an option:\n\
        1. View Portfolio Analytics\n\
        2. Analyze Stock\n\
        3. Manage Portfolio\n\
        4. Risk Management\n\
        5. Set Price Alerts\n\
        6. Exit";
    pub const PROMPT: &'static str = "Enter your choice (1-6): ";
    pub const INVALID: &'static str = "Invalid choice. Please enter 1-6.";

    pub fn parse(input: &str) -> Option<Self> {
        match input.trim() {
            "1" => Some(Self::PortfolioAnalytics),
            "2" => Some(Self::AnalyzeStock),
            "3" => Some(Self::ManagePortfolio),
            "4" => Some(Self::RiskManagement),
            "5" => Some(Self::PriceAlerts),
            "6" => Some(Self::Exit),
            _ => None,
        }
    }
}

/// Portfolio management sub-menu entries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortfolioChoice {
    Add,
    Update,
    Remove,
    View,
    Back,
}

impl PortfolioChoice {
    pub const MENU: &'static str = "\nPortfolio Management:\n\
        1. Add Position\n\
        2. Update Position\n\
        3. Remove Position\n\
        4. View Current Portfolio\n\
        5. Back to Main Menu";
    pub const PROMPT: &'static str = "Enter your choice (1-5): ";
    pub const INVALID: &'static str = "Invalid choice. Please enter 1-5.";

    pub fn parse(input: &str) -> Option<Self> {
        match input.trim() {
            "1" => Some(Self::Add),
            "2" => Some(Self::Update),
            "3" => Some(Self::Remove),
            "4" => Some(Self::View),
            "5" => Some(Self::Back),
            _ => None,
        }
    }
}
