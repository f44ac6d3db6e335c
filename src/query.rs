//! Client-side query pipeline: search, filter, sort, paginate.
//!
//! `compute_view` is a pure function of the dataset and a `QueryState`.
//! The controller calls it after every change; nothing here caches.
use std::cmp::Reverse;

use crate::model::{LocalUser, UserField, UserId};

/// Columns the table can be sorted by.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SortField {
    Id,
    FirstName,
    LastName,
    Email,
    Department,
}

impl SortField {
    pub const ALL: [SortField; 5] = [
        SortField::Id,
        SortField::FirstName,
        SortField::LastName,
        SortField::Email,
        SortField::Department,
    ];

    pub fn header(self) -> &'static str {
        match self {
            SortField::Id => "ID",
            SortField::FirstName => "FIRST",
            SortField::LastName => "LAST",
            SortField::Email => "EMAIL",
            SortField::Department => "DEPARTMENT",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn flip(self) -> Self {
        match self {
            SortOrder::Asc => SortOrder::Desc,
            SortOrder::Desc => SortOrder::Asc,
        }
    }

    pub fn arrow(self) -> &'static str {
        match self {
            SortOrder::Asc => "▲",
            SortOrder::Desc => "▼",
        }
    }
}

/// Allowed rows-per-page choices.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PageSize {
    #[default]
    Ten,
    TwentyFive,
    Fifty,
    Hundred,
}

impl PageSize {
    pub const ALL: [PageSize; 4] = [
        PageSize::Ten,
        PageSize::TwentyFive,
        PageSize::Fifty,
        PageSize::Hundred,
    ];

    pub fn get(self) -> usize {
        match self {
            PageSize::Ten => 10,
            PageSize::TwentyFive => 25,
            PageSize::Fifty => 50,
            PageSize::Hundred => 100,
        }
    }

    /// Next size, wrapping from 100 back to 10.
    pub fn next(self) -> Self {
        match self {
            PageSize::Ten => PageSize::TwentyFive,
            PageSize::TwentyFive => PageSize::Fifty,
            PageSize::Fifty => PageSize::Hundred,
            PageSize::Hundred => PageSize::Ten,
        }
    }
}

impl TryFrom<usize> for PageSize {
    type Error = String;

    fn try_from(value: usize) -> Result<Self, Self::Error> {
        PageSize::ALL
            .into_iter()
            .find(|size| size.get() == value)
            .ok_or_else(|| format!("page size must be one of 10, 25, 50, 100 (got {value})"))
    }
}

/// Per-column substring filters. Empty values match everything.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Filters {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub department: String,
}

impl Filters {
    pub fn get(&self, field: UserField) -> &str {
        match field {
            UserField::FirstName => &self.first_name,
            UserField::LastName => &self.last_name,
            UserField::Email => &self.email,
            UserField::Department => &self.department,
        }
    }

    pub fn set(&mut self, field: UserField, value: impl Into<String>) {
        let slot = match field {
            UserField::FirstName => &mut self.first_name,
            UserField::LastName => &mut self.last_name,
            UserField::Email => &mut self.email,
            UserField::Department => &mut self.department,
        };
        *slot = value.into();
    }

    pub fn is_empty(&self) -> bool {
        UserField::ALL.iter().all(|f| self.get(*f).trim().is_empty())
    }

    /// Fields with a non-empty value, in column order.
    pub fn active(&self) -> Vec<(UserField, &str)> {
        UserField::ALL
            .iter()
            .map(|f| (*f, self.get(*f)))
            .filter(|(_, v)| !v.trim().is_empty())
            .collect()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QueryState {
    pub search_term: String,
    pub filters: Filters,
    pub sort_field: Option<SortField>,
    pub sort_order: SortOrder,
    /// 1-based.
    pub page: usize,
    pub page_size: PageSize,
}

impl Default for QueryState {
    fn default() -> Self {
        Self {
            search_term: String::new(),
            filters: Filters::default(),
            sort_field: None,
            sort_order: SortOrder::Asc,
            page: 1,
            page_size: PageSize::default(),
        }
    }
}

impl QueryState {
    pub fn with_page_size(page_size: PageSize) -> Self {
        Self {
            page_size,
            ..Self::default()
        }
    }

    pub fn search(&mut self, term: impl Into<String>) {
        self.search_term = term.into();
        self.page = 1;
    }

    /// Merge the given filter values into the current ones.
    pub fn set_filters<I, S>(&mut self, partial: I)
    where
        I: IntoIterator<Item = (UserField, S)>,
        S: Into<String>,
    {
        for (field, value) in partial {
            self.filters.set(field, value);
        }
        self.page = 1;
    }

    pub fn clear_filters(&mut self) {
        self.filters = Filters::default();
        self.page = 1;
    }

    /// Same field flips the direction; a new field starts ascending.
    pub fn sort_by(&mut self, field: SortField) {
        if self.sort_field == Some(field) {
            self.sort_order = self.sort_order.flip();
        } else {
            self.sort_field = Some(field);
            self.sort_order = SortOrder::Asc;
        }
    }

    pub fn go_to_page(&mut self, page: usize) {
        self.page = page.max(1);
    }

    pub fn set_page_size(&mut self, page_size: PageSize) {
        self.page_size = page_size;
        self.page = 1;
    }
}

/// Visible slice plus the numbers the pagination bar needs.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ViewResult {
    pub items: Vec<LocalUser>,
    pub total_count: usize,
    pub page: usize,
    pub page_size: usize,
    pub total_pages: usize,
}

impl ViewResult {
    /// 1-based "showing X to Y" bounds; `(0, 0)` when nothing is visible.
    pub fn range(&self) -> (usize, usize) {
        if self.items.is_empty() {
            return (0, 0);
        }
        let start = (self.page - 1) * self.page_size + 1;
        (start, start + self.items.len() - 1)
    }
}

pub fn total_pages(total_count: usize, page_size: usize) -> usize {
    total_count.div_ceil(page_size.max(1))
}

/// `needle` must already be trimmed and lower-cased.
pub fn matches_search(user: &LocalUser, needle: &str) -> bool {
    if needle.is_empty() {
        return true;
    }
    UserField::ALL
        .iter()
        .any(|f| user.field(*f).to_lowercase().contains(needle))
        || user.id.to_string().to_lowercase().contains(needle)
}

pub fn matches_filters(user: &LocalUser, filters: &Filters) -> bool {
    filters.active().into_iter().all(|(field, value)| {
        user.field(field)
            .to_lowercase()
            .contains(&value.trim().to_lowercase())
    })
}

#[derive(PartialEq, Eq, PartialOrd, Ord)]
enum SortKey {
    Id(UserId),
    Text(String),
}

fn sort_key(user: &LocalUser, field: SortField) -> SortKey {
    let text = |s: &str| SortKey::Text(s.to_lowercase());
    match field {
        SortField::Id => SortKey::Id(user.id),
        SortField::FirstName => text(&user.first_name),
        SortField::LastName => text(&user.last_name),
        SortField::Email => text(&user.email),
        SortField::Department => text(&user.department),
    }
}

/// Stable sort; descending reverses the key order, so ties keep their place.
pub fn sort_users(users: &mut [&LocalUser], field: SortField, order: SortOrder) {
    match order {
        SortOrder::Asc => users.sort_by_cached_key(|u| sort_key(u, field)),
        SortOrder::Desc => users.sort_by_cached_key(|u| Reverse(sort_key(u, field))),
    }
}

/// Elements `[(page-1)*page_size, page*page_size)`, clamped to the slice.
pub fn page_slice<T>(items: &[T], page: usize, page_size: usize) -> &[T] {
    let start = (page.max(1) - 1)
        .saturating_mul(page_size)
        .min(items.len());
    let end = start.saturating_add(page_size).min(items.len());
    &items[start..end]
}

pub fn compute_view(users: &[LocalUser], query: &QueryState) -> ViewResult {
    let needle = query.search_term.trim().to_lowercase();
    let mut matched: Vec<&LocalUser> = users
        .iter()
        .filter(|u| matches_search(u, &needle))
        .filter(|u| matches_filters(u, &query.filters))
        .collect();
    let total_count = matched.len();

    if let Some(field) = query.sort_field {
        sort_users(&mut matched, field, query.sort_order);
    }

    let page_size = query.page_size.get();
    let page = query.page.max(1);
    let items = page_slice(&matched, page, page_size)
        .iter()
        .map(|u| (*u).clone())
        .collect();

    ViewResult {
        items,
        total_count,
        page,
        page_size,
        total_pages: total_pages(total_count, page_size),
    }
}

const MAX_VISIBLE_PAGES: usize = 5;

/// Up to five consecutive page numbers around `current`, kept inside `1..=total_pages`.
pub fn page_window(current: usize, total_pages: usize) -> Vec<usize> {
    if total_pages == 0 {
        return Vec::new();
    }
    let mut start = current.saturating_sub(MAX_VISIBLE_PAGES / 2).max(1);
    let end = (start + MAX_VISIBLE_PAGES - 1).min(total_pages);
    if end + 1 - start < MAX_VISIBLE_PAGES {
        start = (end + 1).saturating_sub(MAX_VISIBLE_PAGES).max(1);
    }
    (start..=end).collect()
}
