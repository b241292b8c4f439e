//! Database tests

use super::*;
use crate::models::*;

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rusqlite::params;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn project(db: &Database, name: &str) -> i64 {
        db.create_project(&NewProject {
            name: name.to_string(),
            client: Some("Client".into()),
        })
        .unwrap()
    }

    #[test]
    fn test_in_memory_db() {
        let db = Database::in_memory().unwrap();
        assert!(db.list_projects().unwrap().is_empty());
        assert_eq!(db.count_transactions().unwrap(), 0);
    }

    #[test]
    fn test_migrations_are_idempotent() {
        let db = Database::in_memory().unwrap();
        project(&db, "Riverside");

        let reopened = Database::new(db.path()).unwrap();
        assert_eq!(reopened.list_projects().unwrap().len(), 1);
    }

    #[test]
    fn test_project_crud() {
        let db = Database::in_memory().unwrap();

        let id = project(&db, "  Harbor Loft ");
        let fetched = db.get_project(id).unwrap().unwrap();
        assert_eq!(fetched.name, "Harbor Loft");
        assert_eq!(fetched.client.as_deref(), Some("Client"));

        db.rename_project(id, "Harbor Lofts").unwrap();
        assert_eq!(db.get_project(id).unwrap().unwrap().name, "Harbor Lofts");

        assert!(db.delete_project(id).unwrap());
        assert!(!db.delete_project(id).unwrap());
        assert!(db.get_project(id).unwrap().is_none());
    }

    #[test]
    fn test_project_validation() {
        let db = Database::in_memory().unwrap();
        assert!(db
            .create_project(&NewProject {
                name: "   ".into(),
                client: None,
            })
            .is_err());
        assert!(matches!(
            db.rename_project(999, "Ghost"),
            Err(crate::Error::NotFound(_))
        ));
    }

    #[test]
    fn test_category_upsert() {
        let db = Database::in_memory().unwrap();

        let a = db.create_category("Materials", TransactionType::Expense).unwrap();
        let b = db.create_category("Materials", TransactionType::Expense).unwrap();
        assert_eq!(a, b);

        // Same name, other kind is a different category
        let c = db.create_category("Materials", TransactionType::Income).unwrap();
        assert_ne!(a, c);

        assert_eq!(db.list_categories(None).unwrap().len(), 2);
        let expense = db.list_categories(Some(TransactionType::Expense)).unwrap();
        assert_eq!(expense.len(), 1);
        assert_eq!(expense[0].kind, TransactionType::Expense);
    }

    #[test]
    fn test_insert_transaction_copies_names() {
        let db = Database::in_memory().unwrap();
        let project_id = project(&db, "Riverside");
        let category_id = db.create_category("Progress Payment", TransactionType::Income).unwrap();

        let mut tx = NewTransaction::new(TransactionType::Income, 2500.0, date(2024, 3, 1));
        tx.project_id = Some(project_id);
        tx.category_id = Some(category_id);
        tx.source = Some("Acme Homes".into());
        let id = db.insert_transaction(&tx).unwrap();

        let stored = db.get_transaction(id).unwrap().unwrap();
        assert_eq!(stored.project_name.as_deref(), Some("Riverside"));
        assert_eq!(stored.category_name.as_deref(), Some("Progress Payment"));
        assert_eq!(stored.status, "pending");
        assert_eq!(stored.date, date(2024, 3, 1));
    }

    #[test]
    fn test_insert_transaction_rejects_bad_input() {
        let db = Database::in_memory().unwrap();
        let income_category = db.create_category("Retainer", TransactionType::Income).unwrap();

        let negative = NewTransaction::new(TransactionType::Expense, -5.0, date(2024, 1, 1));
        assert!(db.insert_transaction(&negative).is_err());

        let nan = NewTransaction::new(TransactionType::Expense, f64::NAN, date(2024, 1, 1));
        assert!(db.insert_transaction(&nan).is_err());

        let mut wrong_kind = NewTransaction::new(TransactionType::Expense, 5.0, date(2024, 1, 1));
        wrong_kind.category_id = Some(income_category);
        assert!(db.insert_transaction(&wrong_kind).is_err());

        let mut missing_project =
            NewTransaction::new(TransactionType::Expense, 5.0, date(2024, 1, 1));
        missing_project.project_id = Some(42);
        assert!(matches!(
            db.insert_transaction(&missing_project),
            Err(crate::Error::NotFound(_))
        ));

        assert_eq!(db.count_transactions().unwrap(), 0);
    }

    #[test]
    fn test_list_transactions_newest_first() {
        let db = Database::in_memory().unwrap();
        for day in [3, 1, 2] {
            db.insert_transaction(&NewTransaction::new(
                TransactionType::Income,
                day as f64,
                date(2024, 1, day),
            ))
            .unwrap();
        }

        let listed = db.list_transactions(2, 0).unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].date, date(2024, 1, 3));
        assert_eq!(listed[1].date, date(2024, 1, 2));

        let rest = db.list_transactions(10, 2).unwrap();
        assert_eq!(rest.len(), 1);
        assert_eq!(rest[0].date, date(2024, 1, 1));
    }

    #[test]
    fn test_update_status() {
        let db = Database::in_memory().unwrap();
        let id = db
            .insert_transaction(&NewTransaction::new(
                TransactionType::Expense,
                10.0,
                date(2024, 1, 1),
            ))
            .unwrap();

        db.update_transaction_status(id, "approved").unwrap();
        assert_eq!(db.get_transaction(id).unwrap().unwrap().status, "approved");
        assert!(db.update_transaction_status(id, " ").is_err());
        assert!(db.update_transaction_status(999, "approved").is_err());
    }

    #[test]
    fn test_query_resolves_renamed_project() {
        let db = Database::in_memory().unwrap();
        let project_id = project(&db, "Old Name");
        let mut tx = NewTransaction::new(TransactionType::Income, 100.0, date(2024, 1, 1));
        tx.project_id = Some(project_id);
        db.insert_transaction(&tx).unwrap();

        db.rename_project(project_id, "New Name").unwrap();

        let rows = db.query_transactions(&ReportFilters::default()).unwrap();
        assert_eq!(rows[0].project_name.as_deref(), Some("New Name"));
    }

    #[test]
    fn test_query_falls_back_after_project_delete() {
        let db = Database::in_memory().unwrap();
        let project_id = project(&db, "Demolished");
        let mut tx = NewTransaction::new(TransactionType::Expense, 100.0, date(2024, 1, 1));
        tx.project_id = Some(project_id);
        db.insert_transaction(&tx).unwrap();

        db.delete_project(project_id).unwrap();

        let rows = db.query_transactions(&ReportFilters::default()).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].project_id, None);
        assert_eq!(rows[0].project_name.as_deref(), Some("Demolished"));
    }

    #[test]
    fn test_query_dangling_category_uses_stored_name() {
        let db = Database::in_memory().unwrap();
        let category_id = db.create_category("Scaffolding", TransactionType::Expense).unwrap();
        let mut tx = NewTransaction::new(TransactionType::Expense, 75.0, date(2024, 1, 1));
        tx.category_id = Some(category_id);
        db.insert_transaction(&tx).unwrap();

        // Remove the category behind the reference's back
        let conn = db.conn().unwrap();
        conn.execute_batch("PRAGMA foreign_keys = OFF;").unwrap();
        conn.execute("DELETE FROM categories WHERE id = ?", params![category_id])
            .unwrap();
        conn.execute_batch("PRAGMA foreign_keys = ON;").unwrap();
        drop(conn);

        let rows = db.query_transactions(&ReportFilters::default()).unwrap();
        assert_eq!(rows[0].category_id, Some(category_id));
        assert_eq!(rows[0].expense_category_name.as_deref(), Some("Scaffolding"));
        assert_eq!(rows[0].category_name, None);
    }

    #[test]
    fn test_query_splits_category_by_type() {
        let db = Database::in_memory().unwrap();
        let fee = db.create_category("Design Fee", TransactionType::Income).unwrap();
        let tools = db.create_category("Tools", TransactionType::Expense).unwrap();

        let mut income = NewTransaction::new(TransactionType::Income, 10.0, date(2024, 1, 1));
        income.category_id = Some(fee);
        db.insert_transaction(&income).unwrap();
        let mut expense = NewTransaction::new(TransactionType::Expense, 5.0, date(2024, 1, 2));
        expense.category_id = Some(tools);
        db.insert_transaction(&expense).unwrap();

        let rows = db.query_transactions(&ReportFilters::default()).unwrap();
        assert_eq!(rows[0].category_name.as_deref(), Some("Design Fee"));
        assert_eq!(rows[0].expense_category_name, None);
        assert_eq!(rows[1].category_name, None);
        assert_eq!(rows[1].expense_category_name.as_deref(), Some("Tools"));
    }

    #[test]
    fn test_query_filters() {
        let db = Database::in_memory().unwrap();
        let riverside = project(&db, "Riverside");
        let harbor = project(&db, "Harbor");

        let rows = [
            (TransactionType::Income, 100.0, date(2024, 1, 1), riverside, "bank", "approved"),
            (TransactionType::Expense, 40.0, date(2024, 1, 15), riverside, "cash", "pending"),
            (TransactionType::Expense, 60.0, date(2024, 1, 31), harbor, "bank", "approved"),
            (TransactionType::Income, 500.0, date(2024, 2, 1), harbor, "bank", "paid"),
        ];
        for (tx_type, amount, d, project_id, method, status) in rows {
            let mut tx = NewTransaction::new(tx_type, amount, d);
            tx.project_id = Some(project_id);
            tx.payment_method = Some(method.into());
            tx.status = Some(status.into());
            db.insert_transaction(&tx).unwrap();
        }

        let january = ReportFilters::for_range(date(2024, 1, 1), date(2024, 1, 31));
        assert_eq!(db.query_transactions(&january).unwrap().len(), 3);

        let expenses = january.clone().with_type(TransactionType::Expense);
        assert_eq!(db.query_transactions(&expenses).unwrap().len(), 2);

        let by_project = ReportFilters {
            project_id: Some(harbor),
            ..Default::default()
        };
        assert_eq!(db.query_transactions(&by_project).unwrap().len(), 2);

        let by_method = ReportFilters {
            payment_method: Some("bank".into()),
            ..january.clone()
        };
        assert_eq!(db.query_transactions(&by_method).unwrap().len(), 2);

        let by_status = ReportFilters {
            status: vec!["approved".into(), "paid".into()],
            ..Default::default()
        };
        assert_eq!(db.query_transactions(&by_status).unwrap().len(), 3);

        let open_ended = ReportFilters {
            start_date: Some(date(2024, 1, 31)),
            ..Default::default()
        };
        let rows = db.query_transactions(&open_ended).unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows[0].date <= rows[1].date);
    }
}
