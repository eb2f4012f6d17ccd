//! Lazy pagination over an account's orders list, RFC 8555 §7.1.2.1.

use crate::error::Result;
use crate::json::Json;
use crate::session::Login;

/// A forward-only cursor over an account's `orders` list. Each call to
/// [`OrderList::next_page`] fetches one page and advances using the
/// server's `Link: rel="next"` header rather than pulling the whole list
/// up front.
pub struct OrderList {
    next_url: Option<String>,
}

impl OrderList {
    pub(super) fn new(orders_url: &str) -> Self {
        Self {
            next_url: Some(orders_url.to_string()),
        }
    }

    /// Fetch the next page of order URLs, or `None` once the list is
    /// exhausted.
    pub async fn next_page(&mut self, login: &Login) -> Result<Option<Vec<String>>> {
        let Some(url) = self.next_url.take() else {
            return Ok(None);
        };
        let response = login.session().connection().post_as_get(&url, login.signer()).await?;
        self.next_url = response.link("next").map(str::to_string);

        // RFC 8555 §7.1.2.1: the body is `{"orders": [<url>, ...]}`, not a
        // bare array.
        let root = Json::root(&response.body);
        let orders = match root.optional_field("orders")? {
            Some(orders) => orders
                .as_array()?
                .iter()
                .map(|item| item.as_string().map(str::to_string))
                .collect::<Result<Vec<_>>>()?,
            None => Vec::new(),
        };
        Ok(Some(orders))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_list_starts_with_the_orders_url_as_next() {
        let list = OrderList::new("https://example.com/acme/acct/1/orders");
        assert_eq!(
            list.next_url.as_deref(),
            Some("https://example.com/acme/acct/1/orders")
        );
    }
}
