//! Account resources, RFC 8555 §7.1.2/§7.3: registration, contact
//! updates, deactivation, key rollover, and the account's order list.

pub mod builder;
pub mod key_rollover;
pub mod orders;

pub use builder::AccountBuilder;
pub use key_rollover::change_key;
pub use orders::OrderList;

use crate::error::Result;
use crate::json::Json;
use crate::session::Login;
use crate::types::Contact;

/// Account lifecycle state, RFC 8555 §7.1.2.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountStatus {
    Valid,
    Deactivated,
    Revoked,
}

impl std::str::FromStr for AccountStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "valid" => Ok(AccountStatus::Valid),
            "deactivated" => Ok(AccountStatus::Deactivated),
            "revoked" => Ok(AccountStatus::Revoked),
            _ => Err(format!("unknown account status: {s}")),
        }
    }
}

impl std::fmt::Display for AccountStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            AccountStatus::Valid => "valid",
            AccountStatus::Deactivated => "deactivated",
            AccountStatus::Revoked => "revoked",
        };
        write!(f, "{s}")
    }
}

/// An account resource. Register a new one with [`AccountBuilder`];
/// refresh an existing one with [`Account::fetch`]/[`Account::update`].
#[derive(Debug, Clone)]
pub struct Account {
    kid: String,
    status: AccountStatus,
    contact: Vec<String>,
    terms_of_service_agreed: bool,
    orders_url: Option<String>,
    has_external_account_binding: bool,
}

impl Account {
    pub fn kid(&self) -> &str {
        &self.kid
    }

    pub fn status(&self) -> AccountStatus {
        self.status
    }

    pub fn contact(&self) -> &[String] {
        &self.contact
    }

    pub fn terms_of_service_agreed(&self) -> bool {
        self.terms_of_service_agreed
    }

    pub fn has_external_account_binding(&self) -> bool {
        self.has_external_account_binding
    }

    /// Start a lazily-paginated walk over this account's orders
    /// (RFC 8555 §7.1.2.1), following `Link: rel="next"` one page at a
    /// time rather than eagerly fetching the whole list.
    pub fn orders(&self) -> Option<OrderList> {
        self.orders_url.as_deref().map(OrderList::new)
    }

    /// Fetch the account identified by `login`'s `kid`.
    pub async fn fetch(login: &Login) -> Result<Account> {
        let response = login
            .session()
            .connection()
            .post_as_get(login.kid(), login.signer())
            .await?;
        Self::from_json(login.kid().to_string(), &response.body)
    }

    /// Re-fetch this account's current state in place.
    pub async fn update(&mut self, login: &Login) -> Result<()> {
        let fresh = Self::fetch(login).await?;
        *self = fresh;
        Ok(())
    }

    /// Replace the account's contact list, RFC 8555 §7.3.2.
    pub async fn modify(&mut self, login: &Login, contacts: &[Contact]) -> Result<()> {
        for contact in contacts {
            contact.validate()?;
        }
        let payload = serde_json::json!({
            "contact": contacts.iter().map(Contact::to_uri).collect::<Vec<_>>(),
        });
        let response = login
            .session()
            .connection()
            .post_signed(&self.kid, login.signer(), &payload)
            .await?;
        *self = Self::from_json(self.kid.clone(), &response.body)?;
        Ok(())
    }

    /// Deactivate the account, RFC 8555 §7.3.6. Terminal: once an account
    /// is deactivated the server will reject every further call against it.
    pub async fn deactivate(&mut self, login: &Login) -> Result<()> {
        let payload = serde_json::json!({"status": "deactivated"});
        let response = login
            .session()
            .connection()
            .post_signed(&self.kid, login.signer(), &payload)
            .await?;
        *self = Self::from_json(self.kid.clone(), &response.body)?;
        Ok(())
    }

    fn from_json(kid: String, value: &serde_json::Value) -> Result<Account> {
        let root = Json::root(value);
        let status = root.field("status")?.as_status::<AccountStatus>()?;
        let contact = root
            .optional_field("contact")?
            .map(|c| c.as_array())
            .transpose()?
            .map(|items| {
                items
                    .iter()
                    .map(|i| i.as_string().map(|s| s.to_string()))
                    .collect::<Result<Vec<_>>>()
            })
            .transpose()?
            .unwrap_or_default();
        let terms_of_service_agreed = root
            .optional_field("termsOfServiceAgreed")?
            .map(|v| v.as_bool())
            .transpose()?
            .unwrap_or(false);
        let orders_url = root.optional_field("orders")?.map(|o| o.as_url()).transpose()?;
        let has_external_account_binding = root.optional_field("externalAccountBinding")?.is_some();

        Ok(Account {
            kid,
            status,
            contact,
            terms_of_service_agreed,
            orders_url,
            has_external_account_binding,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_valid_account() {
        let value = serde_json::json!({
            "status": "valid",
            "contact": ["mailto:admin@example.com"],
            "termsOfServiceAgreed": true,
            "orders": "https://example.com/acme/acct/1/orders"
        });
        let account = Account::from_json("https://example.com/acme/acct/1".to_string(), &value).unwrap();
        assert_eq!(account.status(), AccountStatus::Valid);
        assert_eq!(account.contact(), &["mailto:admin@example.com".to_string()]);
        assert!(account.terms_of_service_agreed());
        assert!(account.orders().is_some());
    }

    #[test]
    fn account_with_no_orders_url_has_no_order_list() {
        let value = serde_json::json!({"status": "valid"});
        let account = Account::from_json("https://example.com/acme/acct/2".to_string(), &value).unwrap();
        assert!(account.orders().is_none());
    }
}
