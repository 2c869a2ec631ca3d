//! Financial profile document
//!
//! A sparse document: every field is optional and absence is distinct from zero.
//! Updates are shallow: a nested document in an update replaces the stored one
//! wholesale. Direct edits go through [`ProfileField`], a closed set of every
//! editable field, instead of free-form dotted paths.

use crate::error::{BuddyError, Result};
use crate::format::format_amount;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

//
// ================= Enums =================
//

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum EmploymentStatus {
    Student,
    FullTime,
    PartTime,
    Unemployed,
    Retired,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MaritalStatus {
    Single,
    Married,
    Divorced,
    Widowed,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RiskTolerance {
    Conservative,
    Moderate,
    Aggressive,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CommunicationStyle {
    Detailed,
    Concise,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum KnowledgeLevel {
    Beginner,
    Intermediate,
    Advanced,
}

impl EmploymentStatus {
    pub const LITERALS: &'static [&'static str] =
        &["student", "full-time", "part-time", "unemployed", "retired"];

    pub fn as_str(self) -> &'static str {
        match self {
            EmploymentStatus::Student => "student",
            EmploymentStatus::FullTime => "full-time",
            EmploymentStatus::PartTime => "part-time",
            EmploymentStatus::Unemployed => "unemployed",
            EmploymentStatus::Retired => "retired",
        }
    }
}

impl MaritalStatus {
    pub const LITERALS: &'static [&'static str] = &["single", "married", "divorced", "widowed"];

    pub fn as_str(self) -> &'static str {
        match self {
            MaritalStatus::Single => "single",
            MaritalStatus::Married => "married",
            MaritalStatus::Divorced => "divorced",
            MaritalStatus::Widowed => "widowed",
        }
    }
}

impl RiskTolerance {
    pub const LITERALS: &'static [&'static str] = &["conservative", "moderate", "aggressive"];

    pub fn as_str(self) -> &'static str {
        match self {
            RiskTolerance::Conservative => "conservative",
            RiskTolerance::Moderate => "moderate",
            RiskTolerance::Aggressive => "aggressive",
        }
    }
}

impl CommunicationStyle {
    pub const LITERALS: &'static [&'static str] = &["detailed", "concise"];

    pub fn as_str(self) -> &'static str {
        match self {
            CommunicationStyle::Detailed => "detailed",
            CommunicationStyle::Concise => "concise",
        }
    }
}

impl KnowledgeLevel {
    pub const LITERALS: &'static [&'static str] = &["beginner", "intermediate", "advanced"];

    pub fn as_str(self) -> &'static str {
        match self {
            KnowledgeLevel::Beginner => "beginner",
            KnowledgeLevel::Intermediate => "intermediate",
            KnowledgeLevel::Advanced => "advanced",
        }
    }
}

//
// ================= Nested Documents =================
//

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Assets {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checking_savings: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub investments: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub real_estate: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retirement_accounts: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Liabilities {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credit_card_debt: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub student_loans: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mortgage: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub car_loans: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub other_loans: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyExpenses {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub housing: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub food: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transportation: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub insurance: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entertainment: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub other: Option<f64>,
}

//
// ================= Profile =================
//

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FinancialProfile {
    // Core personal & financial profile
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub income: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub employment_status: Option<EmploymentStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marital_status: Option<MaritalStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dependents: Option<u32>,

    // Financial snapshot
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assets: Option<Assets>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub liabilities: Option<Liabilities>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub monthly_expenses: Option<MonthlyExpenses>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credit_score_range: Option<String>,

    // Goals & preferences
    #[serde(skip_serializing_if = "Option::is_none")]
    pub short_term_goals: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub long_term_goals: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub risk_tolerance: Option<RiskTolerance>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub investment_preferences: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub planning_horizon: Option<String>,

    // Behavioral & advisory needs
    #[serde(skip_serializing_if = "Option::is_none")]
    pub communication_style: Option<CommunicationStyle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interest_topics: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub knowledge_level: Option<KnowledgeLevel>,
}

impl FinancialProfile {
    /// Decode a partial profile from untrusted JSON.
    ///
    /// Wrong types and undeclared enum literals fail here instead of being
    /// coerced; `null` counts as absent.
    pub fn from_json(value: serde_json::Value) -> Result<Self> {
        let profile: FinancialProfile = serde_json::from_value(value)
            .map_err(|e| BuddyError::InvalidProfile(e.to_string()))?;
        profile.validate()?;
        Ok(profile)
    }

    /// Every present amount must be a finite number.
    pub fn validate(&self) -> Result<()> {
        for field in ProfileField::money() {
            if let Some(amount) = field.amount(self) {
                if !amount.is_finite() {
                    return Err(BuddyError::InvalidProfileValue {
                        field: field.label(),
                        reason: format!("{} is not a finite number", amount),
                    });
                }
            }
        }
        Ok(())
    }

    /// Strong entity tag: quoted hex SHA-256 of the serialized document.
    pub fn etag(&self) -> String {
        let body = serde_json::to_string(self).unwrap_or_default();
        format!("\"{}\"", hex::encode(Sha256::digest(body.as_bytes())))
    }

    pub fn is_empty(&self) -> bool {
        *self == FinancialProfile::default()
    }

    /// Shallow merge: every field present in `updates` replaces the stored one.
    pub fn merge(self, updates: FinancialProfile) -> FinancialProfile {
        FinancialProfile {
            age: updates.age.or(self.age),
            income: updates.income.or(self.income),
            employment_status: updates.employment_status.or(self.employment_status),
            location: updates.location.or(self.location),
            marital_status: updates.marital_status.or(self.marital_status),
            dependents: updates.dependents.or(self.dependents),
            assets: updates.assets.or(self.assets),
            liabilities: updates.liabilities.or(self.liabilities),
            monthly_expenses: updates.monthly_expenses.or(self.monthly_expenses),
            credit_score_range: updates.credit_score_range.or(self.credit_score_range),
            short_term_goals: updates.short_term_goals.or(self.short_term_goals),
            long_term_goals: updates.long_term_goals.or(self.long_term_goals),
            risk_tolerance: updates.risk_tolerance.or(self.risk_tolerance),
            investment_preferences: updates
                .investment_preferences
                .or(self.investment_preferences),
            planning_horizon: updates.planning_horizon.or(self.planning_horizon),
            communication_style: updates.communication_style.or(self.communication_style),
            interest_topics: updates.interest_topics.or(self.interest_topics),
            knowledge_level: updates.knowledge_level.or(self.knowledge_level),
        }
    }

    /// Apply a single typed edit in place.
    pub fn apply(&mut self, edit: ProfileEdit) {
        match edit {
            ProfileEdit::Age(v) => self.age = v,
            ProfileEdit::Income(v) => self.income = v,
            ProfileEdit::EmploymentStatus(v) => self.employment_status = v,
            ProfileEdit::Location(v) => self.location = v,
            ProfileEdit::MaritalStatus(v) => self.marital_status = v,
            ProfileEdit::Dependents(v) => self.dependents = v,
            ProfileEdit::Asset(field, v) => {
                if v.is_some() || self.assets.is_some() {
                    *field.slot(self.assets.get_or_insert_with(Assets::default)) = v;
                }
            }
            ProfileEdit::Liability(field, v) => {
                if v.is_some() || self.liabilities.is_some() {
                    *field.slot(self.liabilities.get_or_insert_with(Liabilities::default)) = v;
                }
            }
            ProfileEdit::MonthlyExpense(field, v) => {
                if v.is_some() || self.monthly_expenses.is_some() {
                    *field.slot(
                        self.monthly_expenses
                            .get_or_insert_with(MonthlyExpenses::default),
                    ) = v;
                }
            }
            ProfileEdit::CreditScoreRange(v) => self.credit_score_range = v,
            ProfileEdit::ShortTermGoals(v) => self.short_term_goals = v,
            ProfileEdit::LongTermGoals(v) => self.long_term_goals = v,
            ProfileEdit::RiskTolerance(v) => self.risk_tolerance = v,
            ProfileEdit::InvestmentPreferences(v) => self.investment_preferences = v,
            ProfileEdit::PlanningHorizon(v) => self.planning_horizon = v,
            ProfileEdit::CommunicationStyle(v) => self.communication_style = v,
            ProfileEdit::InterestTopics(v) => self.interest_topics = v,
            ProfileEdit::KnowledgeLevel(v) => self.knowledge_level = v,
        }
    }
}

//
// ================= Field Descriptors =================
//

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetField {
    CheckingSavings,
    Investments,
    RealEstate,
    RetirementAccounts,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LiabilityField {
    CreditCardDebt,
    StudentLoans,
    Mortgage,
    CarLoans,
    OtherLoans,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExpenseField {
    Housing,
    Food,
    Transportation,
    Insurance,
    Entertainment,
    Other,
}

impl AssetField {
    pub const ALL: [AssetField; 4] = [
        AssetField::CheckingSavings,
        AssetField::Investments,
        AssetField::RealEstate,
        AssetField::RetirementAccounts,
    ];

    pub fn key(self) -> &'static str {
        match self {
            AssetField::CheckingSavings => "checkingSavings",
            AssetField::Investments => "investments",
            AssetField::RealEstate => "realEstate",
            AssetField::RetirementAccounts => "retirementAccounts",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            AssetField::CheckingSavings => "Checking & Savings",
            AssetField::Investments => "Investments",
            AssetField::RealEstate => "Real Estate",
            AssetField::RetirementAccounts => "Retirement Accounts",
        }
    }

    fn slot(self, assets: &mut Assets) -> &mut Option<f64> {
        match self {
            AssetField::CheckingSavings => &mut assets.checking_savings,
            AssetField::Investments => &mut assets.investments,
            AssetField::RealEstate => &mut assets.real_estate,
            AssetField::RetirementAccounts => &mut assets.retirement_accounts,
        }
    }

    fn get(self, assets: &Assets) -> Option<f64> {
        match self {
            AssetField::CheckingSavings => assets.checking_savings,
            AssetField::Investments => assets.investments,
            AssetField::RealEstate => assets.real_estate,
            AssetField::RetirementAccounts => assets.retirement_accounts,
        }
    }
}

impl LiabilityField {
    pub const ALL: [LiabilityField; 5] = [
        LiabilityField::CreditCardDebt,
        LiabilityField::StudentLoans,
        LiabilityField::Mortgage,
        LiabilityField::CarLoans,
        LiabilityField::OtherLoans,
    ];

    pub fn key(self) -> &'static str {
        match self {
            LiabilityField::CreditCardDebt => "creditCardDebt",
            LiabilityField::StudentLoans => "studentLoans",
            LiabilityField::Mortgage => "mortgage",
            LiabilityField::CarLoans => "carLoans",
            LiabilityField::OtherLoans => "otherLoans",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            LiabilityField::CreditCardDebt => "Credit Card Debt",
            LiabilityField::StudentLoans => "Student Loans",
            LiabilityField::Mortgage => "Mortgage",
            LiabilityField::CarLoans => "Car Loans",
            LiabilityField::OtherLoans => "Other Loans",
        }
    }

    fn slot(self, liabilities: &mut Liabilities) -> &mut Option<f64> {
        match self {
            LiabilityField::CreditCardDebt => &mut liabilities.credit_card_debt,
            LiabilityField::StudentLoans => &mut liabilities.student_loans,
            LiabilityField::Mortgage => &mut liabilities.mortgage,
            LiabilityField::CarLoans => &mut liabilities.car_loans,
            LiabilityField::OtherLoans => &mut liabilities.other_loans,
        }
    }

    fn get(self, liabilities: &Liabilities) -> Option<f64> {
        match self {
            LiabilityField::CreditCardDebt => liabilities.credit_card_debt,
            LiabilityField::StudentLoans => liabilities.student_loans,
            LiabilityField::Mortgage => liabilities.mortgage,
            LiabilityField::CarLoans => liabilities.car_loans,
            LiabilityField::OtherLoans => liabilities.other_loans,
        }
    }
}

impl ExpenseField {
    pub const ALL: [ExpenseField; 6] = [
        ExpenseField::Housing,
        ExpenseField::Food,
        ExpenseField::Transportation,
        ExpenseField::Insurance,
        ExpenseField::Entertainment,
        ExpenseField::Other,
    ];

    pub fn key(self) -> &'static str {
        match self {
            ExpenseField::Housing => "housing",
            ExpenseField::Food => "food",
            ExpenseField::Transportation => "transportation",
            ExpenseField::Insurance => "insurance",
            ExpenseField::Entertainment => "entertainment",
            ExpenseField::Other => "other",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ExpenseField::Housing => "Monthly Housing",
            ExpenseField::Food => "Monthly Food",
            ExpenseField::Transportation => "Monthly Transportation",
            ExpenseField::Insurance => "Monthly Insurance",
            ExpenseField::Entertainment => "Monthly Entertainment",
            ExpenseField::Other => "Monthly Other Expenses",
        }
    }

    fn slot(self, expenses: &mut MonthlyExpenses) -> &mut Option<f64> {
        match self {
            ExpenseField::Housing => &mut expenses.housing,
            ExpenseField::Food => &mut expenses.food,
            ExpenseField::Transportation => &mut expenses.transportation,
            ExpenseField::Insurance => &mut expenses.insurance,
            ExpenseField::Entertainment => &mut expenses.entertainment,
            ExpenseField::Other => &mut expenses.other,
        }
    }

    fn get(self, expenses: &MonthlyExpenses) -> Option<f64> {
        match self {
            ExpenseField::Housing => expenses.housing,
            ExpenseField::Food => expenses.food,
            ExpenseField::Transportation => expenses.transportation,
            ExpenseField::Insurance => expenses.insurance,
            ExpenseField::Entertainment => expenses.entertainment,
            ExpenseField::Other => expenses.other,
        }
    }
}

/// Every field a user can edit directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProfileField {
    Age,
    EmploymentStatus,
    Location,
    MaritalStatus,
    Dependents,
    Income,
    MonthlyExpense(ExpenseField),
    Asset(AssetField),
    Liability(LiabilityField),
    CreditScoreRange,
    ShortTermGoals,
    LongTermGoals,
    RiskTolerance,
    InvestmentPreferences,
    PlanningHorizon,
    CommunicationStyle,
    InterestTopics,
    KnowledgeLevel,
}

/// A parsed value for one [`ProfileField`]; `None` clears the field.
#[derive(Debug, Clone, PartialEq)]
pub enum ProfileEdit {
    Age(Option<u32>),
    Income(Option<f64>),
    EmploymentStatus(Option<EmploymentStatus>),
    Location(Option<String>),
    MaritalStatus(Option<MaritalStatus>),
    Dependents(Option<u32>),
    Asset(AssetField, Option<f64>),
    Liability(LiabilityField, Option<f64>),
    MonthlyExpense(ExpenseField, Option<f64>),
    CreditScoreRange(Option<String>),
    ShortTermGoals(Option<Vec<String>>),
    LongTermGoals(Option<Vec<String>>),
    RiskTolerance(Option<RiskTolerance>),
    InvestmentPreferences(Option<Vec<String>>),
    PlanningHorizon(Option<String>),
    CommunicationStyle(Option<CommunicationStyle>),
    InterestTopics(Option<Vec<String>>),
    KnowledgeLevel(Option<KnowledgeLevel>),
}

impl ProfileField {
    /// All fields in display order.
    pub fn all() -> Vec<ProfileField> {
        let mut fields = vec![
            ProfileField::Age,
            ProfileField::EmploymentStatus,
            ProfileField::Location,
            ProfileField::MaritalStatus,
            ProfileField::Dependents,
            ProfileField::Income,
        ];
        fields.extend(ExpenseField::ALL.into_iter().map(ProfileField::MonthlyExpense));
        fields.extend(AssetField::ALL.into_iter().map(ProfileField::Asset));
        fields.extend(LiabilityField::ALL.into_iter().map(ProfileField::Liability));
        fields.extend([
            ProfileField::CreditScoreRange,
            ProfileField::ShortTermGoals,
            ProfileField::LongTermGoals,
            ProfileField::RiskTolerance,
            ProfileField::InvestmentPreferences,
            ProfileField::PlanningHorizon,
            ProfileField::CommunicationStyle,
            ProfileField::InterestTopics,
            ProfileField::KnowledgeLevel,
        ]);
        fields
    }

    /// Fields holding a monetary amount.
    pub fn money() -> impl Iterator<Item = ProfileField> {
        std::iter::once(ProfileField::Income)
            .chain(ExpenseField::ALL.into_iter().map(ProfileField::MonthlyExpense))
            .chain(AssetField::ALL.into_iter().map(ProfileField::Asset))
            .chain(LiabilityField::ALL.into_iter().map(ProfileField::Liability))
    }

    /// Stable path in the stored document, e.g. `assets.investments`.
    pub fn path(self) -> String {
        match self {
            ProfileField::MonthlyExpense(f) => format!("monthlyExpenses.{}", f.key()),
            ProfileField::Asset(f) => format!("assets.{}", f.key()),
            ProfileField::Liability(f) => format!("liabilities.{}", f.key()),
            top => top.top_level_key().to_string(),
        }
    }

    fn top_level_key(self) -> &'static str {
        match self {
            ProfileField::Age => "age",
            ProfileField::EmploymentStatus => "employmentStatus",
            ProfileField::Location => "location",
            ProfileField::MaritalStatus => "maritalStatus",
            ProfileField::Dependents => "dependents",
            ProfileField::Income => "income",
            ProfileField::MonthlyExpense(_) => "monthlyExpenses",
            ProfileField::Asset(_) => "assets",
            ProfileField::Liability(_) => "liabilities",
            ProfileField::CreditScoreRange => "creditScoreRange",
            ProfileField::ShortTermGoals => "shortTermGoals",
            ProfileField::LongTermGoals => "longTermGoals",
            ProfileField::RiskTolerance => "riskTolerance",
            ProfileField::InvestmentPreferences => "investmentPreferences",
            ProfileField::PlanningHorizon => "planningHorizon",
            ProfileField::CommunicationStyle => "communicationStyle",
            ProfileField::InterestTopics => "interestTopics",
            ProfileField::KnowledgeLevel => "knowledgeLevel",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ProfileField::Age => "Age",
            ProfileField::EmploymentStatus => "Employment Status",
            ProfileField::Location => "Location",
            ProfileField::MaritalStatus => "Marital Status",
            ProfileField::Dependents => "Dependents",
            ProfileField::Income => "Annual Income",
            ProfileField::MonthlyExpense(f) => f.label(),
            ProfileField::Asset(f) => f.label(),
            ProfileField::Liability(f) => f.label(),
            ProfileField::CreditScoreRange => "Credit Score Range",
            ProfileField::ShortTermGoals => "Short Term Goals",
            ProfileField::LongTermGoals => "Long Term Goals",
            ProfileField::RiskTolerance => "Risk Tolerance",
            ProfileField::InvestmentPreferences => "Investment Preferences",
            ProfileField::PlanningHorizon => "Planning Horizon",
            ProfileField::CommunicationStyle => "Communication Style",
            ProfileField::InterestTopics => "Interest Topics",
            ProfileField::KnowledgeLevel => "Knowledge Level",
        }
    }

    /// Section heading the field is listed under.
    pub fn section(self) -> &'static str {
        match self {
            ProfileField::Age
            | ProfileField::EmploymentStatus
            | ProfileField::Location
            | ProfileField::MaritalStatus
            | ProfileField::Dependents => "Personal Information",
            ProfileField::Income | ProfileField::MonthlyExpense(_) => "Income & Expenses",
            ProfileField::Asset(_) => "Assets",
            ProfileField::Liability(_) | ProfileField::CreditScoreRange => "Liabilities",
            ProfileField::ShortTermGoals
            | ProfileField::LongTermGoals
            | ProfileField::RiskTolerance
            | ProfileField::InvestmentPreferences
            | ProfileField::PlanningHorizon => "Financial Goals",
            ProfileField::CommunicationStyle
            | ProfileField::InterestTopics
            | ProfileField::KnowledgeLevel => "Preferences",
        }
    }

    /// Monetary value of the field, if it is a money field and present.
    fn amount(self, profile: &FinancialProfile) -> Option<f64> {
        match self {
            ProfileField::Income => profile.income,
            ProfileField::Asset(f) => profile.assets.as_ref().and_then(|a| f.get(a)),
            ProfileField::Liability(f) => profile.liabilities.as_ref().and_then(|l| f.get(l)),
            ProfileField::MonthlyExpense(f) => {
                profile.monthly_expenses.as_ref().and_then(|e| f.get(e))
            }
            _ => None,
        }
    }

    /// Parse raw user input into a typed edit for this field.
    pub fn parse_input(self, input: &str) -> Result<ProfileEdit> {
        let input = input.trim();
        let label = self.label();

        let edit = match self {
            ProfileField::Age => ProfileEdit::Age(parse_count(label, input)?),
            ProfileField::Dependents => ProfileEdit::Dependents(parse_count(label, input)?),
            ProfileField::Income => ProfileEdit::Income(parse_amount(label, input)?),
            ProfileField::Asset(f) => ProfileEdit::Asset(f, parse_amount(label, input)?),
            ProfileField::Liability(f) => ProfileEdit::Liability(f, parse_amount(label, input)?),
            ProfileField::MonthlyExpense(f) => {
                ProfileEdit::MonthlyExpense(f, parse_amount(label, input)?)
            }
            ProfileField::EmploymentStatus => ProfileEdit::EmploymentStatus(parse_literal(
                label,
                input,
                EmploymentStatus::LITERALS,
            )?),
            ProfileField::MaritalStatus => {
                ProfileEdit::MaritalStatus(parse_literal(label, input, MaritalStatus::LITERALS)?)
            }
            ProfileField::RiskTolerance => {
                ProfileEdit::RiskTolerance(parse_literal(label, input, RiskTolerance::LITERALS)?)
            }
            ProfileField::CommunicationStyle => ProfileEdit::CommunicationStyle(parse_literal(
                label,
                input,
                CommunicationStyle::LITERALS,
            )?),
            ProfileField::KnowledgeLevel => {
                ProfileEdit::KnowledgeLevel(parse_literal(label, input, KnowledgeLevel::LITERALS)?)
            }
            ProfileField::Location => ProfileEdit::Location(parse_text(input)),
            ProfileField::CreditScoreRange => ProfileEdit::CreditScoreRange(parse_text(input)),
            ProfileField::PlanningHorizon => ProfileEdit::PlanningHorizon(parse_text(input)),
            ProfileField::ShortTermGoals => ProfileEdit::ShortTermGoals(parse_list(input)),
            ProfileField::LongTermGoals => ProfileEdit::LongTermGoals(parse_list(input)),
            ProfileField::InvestmentPreferences => {
                ProfileEdit::InvestmentPreferences(parse_list(input))
            }
            ProfileField::InterestTopics => ProfileEdit::InterestTopics(parse_list(input)),
        };

        Ok(edit)
    }

    /// Human-readable value of this field in `profile`.
    pub fn display(self, profile: &FinancialProfile) -> String {
        const MISSING: &str = "Not specified";

        let text = |v: &Option<String>| v.clone().unwrap_or_else(|| MISSING.to_string());
        let list = |v: &Option<Vec<String>>| match v {
            Some(items) if !items.is_empty() => items.join(", "),
            _ => MISSING.to_string(),
        };
        let literal = |v: Option<&'static str>| v.unwrap_or(MISSING).to_string();

        match self {
            ProfileField::Age => profile.age.map_or_else(|| MISSING.to_string(), |v| v.to_string()),
            ProfileField::Dependents => profile
                .dependents
                .map_or_else(|| MISSING.to_string(), |v| v.to_string()),
            ProfileField::Income
            | ProfileField::Asset(_)
            | ProfileField::Liability(_)
            | ProfileField::MonthlyExpense(_) => format_amount(self.amount(profile)),
            ProfileField::EmploymentStatus => {
                literal(profile.employment_status.map(EmploymentStatus::as_str))
            }
            ProfileField::MaritalStatus => literal(profile.marital_status.map(MaritalStatus::as_str)),
            ProfileField::RiskTolerance => literal(profile.risk_tolerance.map(RiskTolerance::as_str)),
            ProfileField::CommunicationStyle => {
                literal(profile.communication_style.map(CommunicationStyle::as_str))
            }
            ProfileField::KnowledgeLevel => {
                literal(profile.knowledge_level.map(KnowledgeLevel::as_str))
            }
            ProfileField::Location => text(&profile.location),
            ProfileField::CreditScoreRange => text(&profile.credit_score_range),
            ProfileField::PlanningHorizon => text(&profile.planning_horizon),
            ProfileField::ShortTermGoals => list(&profile.short_term_goals),
            ProfileField::LongTermGoals => list(&profile.long_term_goals),
            ProfileField::InvestmentPreferences => list(&profile.investment_preferences),
            ProfileField::InterestTopics => list(&profile.interest_topics),
        }
    }
}

impl FromStr for ProfileField {
    type Err = BuddyError;

    fn from_str(path: &str) -> Result<Self> {
        let unknown = || BuddyError::UnknownProfileField(path.to_string());

        if let Some((parent, key)) = path.split_once('.') {
            let field = match parent {
                "assets" => AssetField::ALL
                    .into_iter()
                    .find(|f| f.key() == key)
                    .map(ProfileField::Asset),
                "liabilities" => LiabilityField::ALL
                    .into_iter()
                    .find(|f| f.key() == key)
                    .map(ProfileField::Liability),
                "monthlyExpenses" => ExpenseField::ALL
                    .into_iter()
                    .find(|f| f.key() == key)
                    .map(ProfileField::MonthlyExpense),
                _ => None,
            };
            return field.ok_or_else(unknown);
        }

        ProfileField::all()
            .into_iter()
            .filter(|f| {
                !matches!(
                    f,
                    ProfileField::Asset(_)
                        | ProfileField::Liability(_)
                        | ProfileField::MonthlyExpense(_)
                )
            })
            .find(|f| f.top_level_key() == path)
            .ok_or_else(unknown)
    }
}

impl fmt::Display for ProfileField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path())
    }
}

//
// ================= Input Parsing =================
//

fn parse_text(input: &str) -> Option<String> {
    (!input.is_empty()).then(|| input.to_string())
}

fn parse_list(input: &str) -> Option<Vec<String>> {
    let items: Vec<String> = input
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect();
    (!items.is_empty()).then_some(items)
}

fn parse_amount(field: &'static str, input: &str) -> Result<Option<f64>> {
    if input.is_empty() {
        return Ok(None);
    }

    let cleaned: String = input
        .strip_prefix('$')
        .unwrap_or(input)
        .chars()
        .filter(|c| *c != ',')
        .collect();

    match cleaned.parse::<f64>() {
        Ok(amount) if amount.is_finite() => Ok(Some(amount)),
        _ => Err(BuddyError::InvalidProfileValue {
            field,
            reason: format!("'{}' is not an amount", input),
        }),
    }
}

fn parse_count(field: &'static str, input: &str) -> Result<Option<u32>> {
    if input.is_empty() {
        return Ok(None);
    }

    input
        .parse::<u32>()
        .map(Some)
        .map_err(|_| BuddyError::InvalidProfileValue {
            field,
            reason: format!("'{}' is not a whole number", input),
        })
}

fn parse_literal<T: DeserializeOwned>(
    field: &'static str,
    input: &str,
    literals: &[&str],
) -> Result<Option<T>> {
    if input.is_empty() {
        return Ok(None);
    }

    serde_json::from_value(serde_json::Value::String(input.to_lowercase()))
        .map(Some)
        .map_err(|_| BuddyError::InvalidProfileValue {
            field,
            reason: format!("expected one of: {}", literals.join(", ")),
        })
}
