// src/services/db.rs
use chrono::Utc;
use rand::Rng;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::models::{BookedCall, FileSet, Loan, StoredFile, StoredQuote, User};
use crate::BoxError;

/// In-process document store.
///
/// Keeps the accessor shape of a database layer (async methods returning
/// `Result<_, BoxError>`) over `RwLock`-guarded maps: users with
/// email/phone lookup, one loan and one file set per user, an append-only
/// quote history per user, and booked consultation calls.
pub struct DocumentStore {
    users: RwLock<HashMap<String, User>>,
    quotes: RwLock<HashMap<String, Vec<StoredQuote>>>,
    loans: RwLock<HashMap<String, Loan>>,
    file_sets: RwLock<HashMap<String, FileSet>>,
    booked_calls: RwLock<Vec<BookedCall>>,
}

/// Optional replacements for the editable loan fields; `None` keeps the
/// stored value.
#[derive(Debug, Default, Clone, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanUpdate {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub landmark: Option<String>,
    pub solar_system_size: Option<String>,
    pub occupation: Option<String>,
    pub annualincome: Option<String>,
}

/// A fresh 12-byte hex record id.
pub fn record_id() -> String {
    let bytes: [u8; 12] = rand::thread_rng().gen();
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

impl DocumentStore {
    pub fn new() -> Self {
        DocumentStore {
            users: RwLock::new(HashMap::new()),
            quotes: RwLock::new(HashMap::new()),
            loans: RwLock::new(HashMap::new()),
            file_sets: RwLock::new(HashMap::new()),
            booked_calls: RwLock::new(Vec::new()),
        }
    }

    pub async fn create_user(
        &self,
        name: &str,
        email: &str,
        tele: &str,
        password: &str,
    ) -> Result<User, BoxError> {
        let mut users = self.users.write().await;
        if users.values().any(|u| u.email == email) {
            return Err("email already registered".into());
        }
        if users.values().any(|u| u.tele == tele) {
            return Err("phone number already registered".into());
        }
        let user = User {
            id: record_id(),
            name: name.to_string(),
            email: email.to_string(),
            tele: tele.to_string(),
            password: password.to_string(),
            reset_code: None,
            reset_code_expiry: None,
            created_at: Utc::now(),
            roles: vec!["user".to_string()],
        };
        users.insert(user.id.clone(), user.clone());
        Ok(user)
    }

    pub async fn get_user(&self, id: &str) -> Result<Option<User>, BoxError> {
        Ok(self.users.read().await.get(id).cloned())
    }

    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, BoxError> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    pub async fn find_user_by_phone(&self, tele: &str) -> Result<Option<User>, BoxError> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|u| u.tele == tele)
            .cloned())
    }

    /// Replace the stored record for `user.id`.
    pub async fn update_user(&self, user: &User) -> Result<(), BoxError> {
        let mut users = self.users.write().await;
        match users.get_mut(&user.id) {
            Some(existing) => {
                *existing = user.clone();
                Ok(())
            }
            None => Err("user not found".into()),
        }
    }

    /// Append an estimate to the user's quote history. Histories are
    /// order-preserving and never edited.
    pub async fn push_quote(&self, user_id: &str, quote: StoredQuote) -> Result<(), BoxError> {
        if !self.users.read().await.contains_key(user_id) {
            return Err("user not found".into());
        }
        self.quotes
            .write()
            .await
            .entry(user_id.to_string())
            .or_default()
            .push(quote);
        Ok(())
    }

    pub async fn get_quotes(&self, user_id: &str) -> Result<Vec<StoredQuote>, BoxError> {
        Ok(self
            .quotes
            .read()
            .await
            .get(user_id)
            .cloned()
            .unwrap_or_default())
    }

    /// Insert or replace the user's loan application.
    pub async fn upsert_loan(&self, loan: Loan) -> Result<(), BoxError> {
        self.loans.write().await.insert(loan.user_id.clone(), loan);
        Ok(())
    }

    pub async fn get_loan(&self, user_id: &str) -> Result<Option<Loan>, BoxError> {
        Ok(self.loans.read().await.get(user_id).cloned())
    }

    pub async fn update_loan(
        &self,
        user_id: &str,
        update: LoanUpdate,
    ) -> Result<Option<Loan>, BoxError> {
        let mut loans = self.loans.write().await;
        let Some(loan) = loans.get_mut(user_id) else {
            return Ok(None);
        };
        if let Some(name) = update.name {
            loan.name = name;
        }
        if let Some(phone) = update.phone {
            loan.phone = phone;
        }
        if let Some(email) = update.email {
            loan.email = email;
        }
        if let Some(address) = update.address {
            loan.address = address;
        }
        if let Some(landmark) = update.landmark {
            loan.landmark = landmark;
        }
        if let Some(size) = update.solar_system_size {
            loan.solar_system_size = size;
        }
        if let Some(occupation) = update.occupation {
            loan.occupation = occupation;
        }
        if let Some(income) = update.annualincome {
            loan.annualincome = income;
        }
        Ok(Some(loan.clone()))
    }

    /// Attach uploaded documents to the user's loan, creating a bare loan
    /// record if none exists yet.
    pub async fn push_loan_files(
        &self,
        user_id: &str,
        files: Vec<StoredFile>,
    ) -> Result<Loan, BoxError> {
        let mut loans = self.loans.write().await;
        let loan = loans.entry(user_id.to_string()).or_insert_with(|| Loan {
            id: record_id(),
            user_id: user_id.to_string(),
            name: String::new(),
            phone: String::new(),
            email: String::new(),
            address: String::new(),
            landmark: String::new(),
            solar_system_size: String::new(),
            occupation: String::new(),
            annualincome: String::new(),
            created_at: Utc::now(),
            files: Vec::new(),
        });
        loan.files.extend(files);
        Ok(loan.clone())
    }

    pub async fn push_files(
        &self,
        user_id: &str,
        files: Vec<StoredFile>,
    ) -> Result<FileSet, BoxError> {
        let mut sets = self.file_sets.write().await;
        let set = sets.entry(user_id.to_string()).or_insert_with(|| FileSet {
            user_id: user_id.to_string(),
            files: Vec::new(),
        });
        set.files.extend(files);
        Ok(set.clone())
    }

    pub async fn get_file_set(&self, user_id: &str) -> Result<Option<FileSet>, BoxError> {
        Ok(self.file_sets.read().await.get(user_id).cloned())
    }

    /// Remove one file from the user's set, returning it so the caller can
    /// unlink the bytes on disk.
    pub async fn remove_file(
        &self,
        user_id: &str,
        file_id: &str,
    ) -> Result<Option<StoredFile>, BoxError> {
        let mut sets = self.file_sets.write().await;
        let Some(set) = sets.get_mut(user_id) else {
            return Ok(None);
        };
        let Some(pos) = set.files.iter().position(|f| f.id == file_id) else {
            return Ok(None);
        };
        Ok(Some(set.files.remove(pos)))
    }

    pub async fn insert_booked_call(&self, call: BookedCall) -> Result<(), BoxError> {
        self.booked_calls.write().await.push(call);
        Ok(())
    }

    pub async fn booked_call_count(&self) -> usize {
        self.booked_calls.read().await.len()
    }
}

impl Default for DocumentStore {
    fn default() -> Self {
        Self::new()
    }
}
