use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::models::Account;
use crate::store::{AccountFilter, AccountOrdering, LastLoginRange};

pub const PER_PAGE: u32 = 25;

/// Sidebar choices for the `last_login` filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LastLoginFilter {
    Any,
    Today,
    #[serde(rename = "past_7_days")]
    Past7Days,
    ThisMonth,
    ThisYear,
    NoDate,
    HasDate,
}

fn midnight(date: NaiveDate) -> Option<DateTime<Utc>> {
    date.and_hms_opt(0, 0, 0)
        .map(|naive| Utc.from_utc_datetime(&naive))
}

fn first_of_next_month(date: NaiveDate) -> Option<NaiveDate> {
    if date.month() == 12 {
        NaiveDate::from_ymd_opt(date.year() + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(date.year(), date.month() + 1, 1)
    }
}

impl LastLoginFilter {
    /// Resolves the choice against the current time. Bounds are computed in UTC.
    pub fn resolve(self, now: DateTime<Utc>) -> Option<LastLoginRange> {
        let today = now.date_naive();
        let tomorrow = today.succ_opt()?;

        let (start, end) = match self {
            LastLoginFilter::Any => return None,
            LastLoginFilter::NoDate => return Some(LastLoginRange::Missing),
            LastLoginFilter::HasDate => return Some(LastLoginRange::Present),
            LastLoginFilter::Today => (today, tomorrow),
            LastLoginFilter::Past7Days => (today - Duration::days(7), tomorrow),
            LastLoginFilter::ThisMonth => {
                let first = today.with_day(1)?;
                (first, first_of_next_month(first)?)
            }
            LastLoginFilter::ThisYear => (
                NaiveDate::from_ymd_opt(today.year(), 1, 1)?,
                NaiveDate::from_ymd_opt(today.year() + 1, 1, 1)?,
            ),
        };

        Some(LastLoginRange::Between {
            start: midnight(start)?,
            end: midnight(end)?,
        })
    }
}

/// Query string accepted by the account list view.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdminListQuery {
    /// Free-text search over email and name.
    pub q: Option<String>,
    pub is_active: Option<bool>,
    pub is_staff: Option<bool>,
    pub is_admin: Option<bool>,
    pub is_user: Option<bool>,
    pub last_login: Option<LastLoginFilter>,
    /// Date drill-down on `last_login`.
    pub year: Option<i32>,
    pub month: Option<u32>,
    pub day: Option<u32>,
    pub ordering: Option<AccountOrdering>,
    pub page: Option<u32>,
}

impl AdminListQuery {
    pub fn page(&self) -> Result<u32, AppError> {
        match self.page {
            Some(0) => Err(AppError::BadRequest("Page numbers start at 1".into())),
            Some(page) => Ok(page),
            None => Ok(1),
        }
    }

    pub fn ordering(&self) -> AccountOrdering {
        self.ordering.unwrap_or(AccountOrdering::EmailAsc)
    }

    fn hierarchy_range(&self) -> Result<Option<LastLoginRange>, AppError> {
        let invalid = || AppError::BadRequest("Invalid date drill-down".into());

        let (start, end) = match (self.year, self.month, self.day) {
            (None, None, None) => return Ok(None),
            (Some(year), None, None) => (
                NaiveDate::from_ymd_opt(year, 1, 1).ok_or_else(invalid)?,
                NaiveDate::from_ymd_opt(year + 1, 1, 1).ok_or_else(invalid)?,
            ),
            (Some(year), Some(month), None) => {
                let start = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(invalid)?;
                (start, first_of_next_month(start).ok_or_else(invalid)?)
            }
            (Some(year), Some(month), Some(day)) => {
                let start = NaiveDate::from_ymd_opt(year, month, day).ok_or_else(invalid)?;
                (start, start.succ_opt().ok_or_else(invalid)?)
            }
            _ => return Err(invalid()),
        };

        Ok(Some(LastLoginRange::Between {
            start: midnight(start).ok_or_else(invalid)?,
            end: midnight(end).ok_or_else(invalid)?,
        }))
    }

    pub fn to_filter(&self, now: DateTime<Utc>) -> Result<AccountFilter, AppError> {
        let mut last_login: Vec<LastLoginRange> = self
            .last_login
            .and_then(|choice| choice.resolve(now))
            .into_iter()
            .collect();
        last_login.extend(self.hierarchy_range()?);

        Ok(AccountFilter {
            search_terms: self
                .q
                .as_deref()
                .unwrap_or_default()
                .split_whitespace()
                .map(str::to_string)
                .collect(),
            is_active: self.is_active,
            is_staff: self.is_staff,
            is_admin: self.is_admin,
            is_user: self.is_user,
            last_login,
            ids: None,
        })
    }
}

/// One line of the account list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountRow {
    pub id: i32,
    pub email: String,
    pub name: String,
    pub is_active: bool,
    pub is_staff: bool,
    pub is_admin: bool,
    pub is_user: bool,
    pub last_login: Option<DateTime<Utc>>,
    pub date_joined: String,
}

impl From<Account> for AccountRow {
    fn from(account: Account) -> Self {
        Self {
            date_joined: account.date_joined_display(),
            id: account.id,
            email: account.email,
            name: account.name,
            is_active: account.is_active,
            is_staff: account.is_staff,
            is_admin: account.is_admin,
            is_user: account.is_user,
            last_login: account.last_login,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminPage {
    pub results: Vec<AccountRow>,
    pub count: i64,
    pub page: u32,
    pub num_pages: u32,
    pub per_page: u32,
}

impl AdminPage {
    pub fn new(accounts: Vec<Account>, count: i64, page: u32) -> Self {
        let num_pages = ((count.max(0) as u64 + PER_PAGE as u64 - 1) / PER_PAGE as u64).max(1);
        Self {
            results: accounts.into_iter().map(AccountRow::from).collect(),
            count,
            page,
            num_pages: num_pages as u32,
            per_page: PER_PAGE,
        }
    }
}
