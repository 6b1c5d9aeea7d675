pub mod admin;
pub mod cart;
pub mod order;
pub mod product;

use serde::Deserialize;

use storefront_domain::pagination::PageRequest;

/// `?per-page=&page=` on list endpoints.
#[derive(Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub struct PageQuery {
    pub per_page: Option<u32>,
    pub page: Option<u32>,
}

impl PageQuery {
    pub fn page_request(&self) -> PageRequest {
        PageRequest::from_query(self.per_page, self.page)
    }
}
