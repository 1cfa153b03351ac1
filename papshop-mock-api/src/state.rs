//! Shared mock backend state

use std::collections::{BTreeMap, HashSet};

use serde_json::{json, Value};

use crate::auth::{self, AuthError, JwtIssuer};

/// Seeded account
#[derive(Debug, Clone)]
pub struct Account {
    pub id: u64,
    pub email: String,
    pub username: String,
    pub phone: String,
    pub password_hash: String,
    pub scope: String,
}

impl Account {
    /// Whether `identifier` names this account (email, phone or username)
    pub fn matches(&self, identifier: &str) -> bool {
        self.email == identifier || self.username == identifier || self.phone == identifier
    }
}

/// Listing collections served by the mock
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Collection {
    Products,
    Categories,
    Orders,
    Users,
    Announcements,
}

/// Shared application state
pub struct MockState {
    /// JWT issuer for login
    pub issuer: JwtIssuer,

    /// Accounts allowed to log in
    pub accounts: Vec<Account>,

    /// Tokens invalidated by logout
    pub revoked: HashSet<String>,

    /// Sample records per collection
    pub data: BTreeMap<Collection, Vec<Value>>,
}

impl MockState {
    /// State with the demo accounts and sample catalogue
    pub fn new(issuer: JwtIssuer) -> Result<Self, AuthError> {
        let accounts = vec![
            Account {
                id: 1,
                email: "admin@pap.com".to_string(),
                username: "admin".to_string(),
                phone: "0900000001".to_string(),
                password_hash: auth::hash_password("admin123")?,
                scope: "ADMIN".to_string(),
            },
            Account {
                id: 2,
                email: "user@pap.com".to_string(),
                username: "user".to_string(),
                phone: "0900000002".to_string(),
                password_hash: auth::hash_password("user123")?,
                scope: "USER".to_string(),
            },
        ];

        let users = accounts
            .iter()
            .map(|a| {
                json!({
                    "id": a.id,
                    "username": a.username,
                    "email": a.email,
                    "role": a.scope,
                    "status": "ACTIVE",
                })
            })
            .collect();

        let mut data = BTreeMap::new();
        data.insert(
            Collection::Products,
            vec![
                json!({"id": 1, "sku": "P001", "name": "iPhone 15", "price": 25000000, "stock": 50}),
                json!({"id": 2, "sku": "P002", "name": "Samsung Galaxy S24", "price": 22000000, "stock": 30}),
                json!({"id": 3, "sku": "P003", "name": "MacBook Pro", "price": 45000000, "stock": 20}),
            ],
        );
        data.insert(
            Collection::Categories,
            vec![
                json!({"id": 1, "name": "Điện thoại"}),
                json!({"id": 2, "name": "Laptop"}),
            ],
        );
        data.insert(
            Collection::Orders,
            vec![
                json!({"id": 1001, "username": "user", "status": "PENDING", "totalAmount": 25000000}),
                json!({"id": 1002, "username": "user", "status": "DELIVERED", "totalAmount": 45000000}),
            ],
        );
        data.insert(Collection::Users, users);
        data.insert(
            Collection::Announcements,
            vec![json!({"id": 1, "title": "Khuyến mãi", "message": "Giảm giá 10%", "isActive": true})],
        );

        Ok(Self {
            issuer,
            accounts,
            revoked: HashSet::new(),
            data,
        })
    }

    /// Account named by an email, username or phone number
    pub fn find_account(&self, identifier: &str) -> Option<&Account> {
        self.accounts.iter().find(|a| a.matches(identifier))
    }

    /// Token for an account whose password was already checked
    pub fn issue_for(&self, account: &Account) -> Result<String, AuthError> {
        self.issuer.issue(&account.email, &account.scope)
    }

    /// Claims of a valid, unrevoked token
    pub fn verify(&self, token: &str) -> Option<auth::Claims> {
        if self.revoked.contains(token) {
            return None;
        }
        self.issuer.verify(token).ok()
    }

    pub fn revoke(&mut self, token: &str) {
        self.revoked.insert(token.to_string());
    }

    pub fn list(&self, collection: Collection) -> Vec<Value> {
        self.data.get(&collection).cloned().unwrap_or_default()
    }

    /// Remove a record by id; false if it did not exist
    pub fn remove(&mut self, collection: Collection, id: u64) -> bool {
        let Some(items) = self.data.get_mut(&collection) else {
            return false;
        };
        let before = items.len();
        items.retain(|item| item.get("id").and_then(Value::as_u64) != Some(id));
        items.len() != before
    }

    /// Aggregate figures for the dashboard
    pub fn stats(&self) -> Value {
        let orders = self.list(Collection::Orders);
        let revenue: u64 = orders
            .iter()
            .filter_map(|o| o.get("totalAmount").and_then(Value::as_u64))
            .sum();

        json!({
            "totalProducts": self.list(Collection::Products).len(),
            "totalCategories": self.list(Collection::Categories).len(),
            "totalOrders": orders.len(),
            "totalUsers": self.list(Collection::Users).len(),
            "totalRevenue": revenue,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> MockState {
        MockState::new(JwtIssuer::new(&auth::generate_secret(), 60)).unwrap()
    }

    fn login(s: &MockState, identifier: &str, password: &str) -> Option<String> {
        let account = s.find_account(identifier)?;
        auth::verify_password(password, &account.password_hash).ok()?;
        s.issue_for(account).ok()
    }

    #[test]
    fn test_login_by_any_identifier() {
        let s = state();
        for id in ["admin@pap.com", "admin", "0900000001"] {
            let token = login(&s, id, "admin123").unwrap();
            assert_eq!(s.verify(&token).unwrap().scope, "ADMIN");
        }
        assert!(login(&s, "admin@pap.com", "nope").is_none());
        assert!(s.find_account("ghost@pap.com").is_none());
    }

    #[test]
    fn test_revoked_token_fails_verification() {
        let mut s = state();
        let token = login(&s, "user", "user123").unwrap();
        assert!(s.verify(&token).is_some());

        s.revoke(&token);
        assert!(s.verify(&token).is_none());
    }

    #[test]
    fn test_remove_and_stats() {
        let mut s = state();
        assert_eq!(s.stats()["totalProducts"], 3);
        assert_eq!(s.stats()["totalRevenue"], 70000000);

        assert!(s.remove(Collection::Products, 2));
        assert!(!s.remove(Collection::Products, 2));
        assert_eq!(s.stats()["totalProducts"], 2);
    }
}
