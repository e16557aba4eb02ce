use customer_core::{
    AddressFields, Customer, CustomerRepository, Document, DomainErrorKind,
    InMemoryCustomerRepository, RepoError,
};
use std::thread;
use uuid::Uuid;

fn complete_customer(name: &str, cpf: &str) -> Customer {
    let mut customer = Customer::create(name).unwrap();
    customer.add_email("contact@example.com", true).unwrap();
    customer.add_phone("11", "987654321", true).unwrap();
    customer
        .add_address(
            AddressFields {
                street: "Rua das Flores".to_string(),
                number: "100".to_string(),
                complement: None,
                city: "Sao Paulo".to_string(),
                state: "SP".to_string(),
                zip_code: "01000-000".to_string(),
                country: "Brasil".to_string(),
            },
            true,
        )
        .unwrap();
    customer
        .add_document(Document::create(cpf, "CPF").unwrap())
        .unwrap();
    customer
}

#[test]
fn add_and_get_roundtrip_returns_detached_copy() {
    let repo = InMemoryCustomerRepository::new();
    let customer = complete_customer("Ana Souza", "123.456.789-01");
    repo.add(&customer).unwrap();

    let mut loaded = repo.get_by_id(customer.id()).unwrap().unwrap();
    assert_eq!(loaded.name(), "Ana Souza");
    assert_eq!(loaded.documents(), customer.documents());

    loaded.update_name("Changed Locally").unwrap();
    let reloaded = repo.get_by_id(customer.id()).unwrap().unwrap();
    assert_eq!(reloaded.name(), "Ana Souza");
}

#[test]
fn add_rejects_incomplete_customer() {
    let repo = InMemoryCustomerRepository::new();
    let customer = Customer::create("Ana Souza").unwrap();

    let err = repo.add(&customer).unwrap_err();

    match err {
        RepoError::Domain(domain) => {
            assert_eq!(domain.kind(), DomainErrorKind::Invariant);
            assert_eq!(domain.message(), "customer must have at least one email");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(!repo.customer_exists(customer.id()).unwrap());
}

#[test]
fn add_rejects_document_owned_by_another_customer() {
    let repo = InMemoryCustomerRepository::new();
    repo.add(&complete_customer("Ana Souza", "123.456.789-01"))
        .unwrap();

    let err = repo
        .add(&complete_customer("Bruno Lima", "12345678901"))
        .unwrap_err();

    match err {
        RepoError::Conflict { document_number } => assert_eq!(document_number, "12345678901"),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(repo.get_all().unwrap().len(), 1);
}

#[test]
fn conflict_is_reported_before_completeness() {
    let repo = InMemoryCustomerRepository::new();
    repo.add(&complete_customer("Ana Souza", "12345678901"))
        .unwrap();

    let mut incomplete = Customer::create("Bruno Lima").unwrap();
    incomplete
        .add_document(Document::create("12345678901", "CPF").unwrap())
        .unwrap();

    assert!(matches!(
        repo.add(&incomplete),
        Err(RepoError::Conflict { .. })
    ));
}

#[test]
fn adding_same_customer_twice_is_a_document_conflict() {
    let repo = InMemoryCustomerRepository::new();
    let customer = complete_customer("Ana Souza", "12345678901");
    repo.add(&customer).unwrap();

    match repo.add(&customer).unwrap_err() {
        RepoError::Conflict { document_number } => assert_eq!(document_number, "12345678901"),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(repo.get_all().unwrap().len(), 1);
}

#[test]
fn update_unknown_customer_is_not_found_even_when_incomplete() {
    let repo = InMemoryCustomerRepository::new();
    let customer = Customer::create("Ana Souza").unwrap();

    match repo.update(&customer).unwrap_err() {
        RepoError::NotFound(id) => assert_eq!(id, customer.id()),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn update_keeps_own_documents_and_rejects_foreign_ones() {
    let repo = InMemoryCustomerRepository::new();
    let mut ana = complete_customer("Ana Souza", "12345678901");
    let bruno = complete_customer("Bruno Lima", "98765432100");
    repo.add(&ana).unwrap();
    repo.add(&bruno).unwrap();

    ana.update_name("Ana Maria Souza").unwrap();
    repo.update(&ana).unwrap();
    assert_eq!(
        repo.get_by_id(ana.id()).unwrap().unwrap().name(),
        "Ana Maria Souza"
    );

    ana.add_document(Document::create("987.654.321-00", "CPF").unwrap())
        .unwrap();
    match repo.update(&ana).unwrap_err() {
        RepoError::Conflict { document_number } => assert_eq!(document_number, "98765432100"),
        other => panic!("unexpected error: {other}"),
    }
    let stored = repo.get_by_id(ana.id()).unwrap().unwrap();
    assert_eq!(stored.documents().len(), 1);
}

#[test]
fn update_rejects_customer_that_lost_required_data() {
    let repo = InMemoryCustomerRepository::new();
    let mut customer = complete_customer("Ana Souza", "12345678901");
    repo.add(&customer).unwrap();

    customer.remove_document("12345678901").unwrap();

    match repo.update(&customer).unwrap_err() {
        RepoError::Domain(domain) => {
            assert_eq!(domain.message(), "customer must have at least one document")
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(repo.document_exists("12345678901").unwrap());
}

#[test]
fn delete_removes_customer_and_unknown_id_is_not_found() {
    let repo = InMemoryCustomerRepository::new();
    let customer = complete_customer("Ana Souza", "12345678901");
    repo.add(&customer).unwrap();

    repo.delete(customer.id()).unwrap();

    assert!(repo.get_by_id(customer.id()).unwrap().is_none());
    assert!(!repo.document_exists("12345678901").unwrap());
    assert!(matches!(
        repo.delete(customer.id()),
        Err(RepoError::NotFound(_))
    ));
    assert!(matches!(
        repo.delete(Uuid::new_v4()),
        Err(RepoError::NotFound(_))
    ));
}

#[test]
fn document_lookups_normalize_input() {
    let repo = InMemoryCustomerRepository::new();
    let customer = complete_customer("Ana Souza", "12345678901");
    repo.add(&customer).unwrap();

    let found = repo.get_by_document("123.456.789-01").unwrap().unwrap();
    assert_eq!(found.id(), customer.id());
    assert!(repo.document_exists(" 123 456 789 01 ").unwrap());
    assert!(!repo.document_exists("00000000000").unwrap());
    assert!(repo.get_by_document("00000000000").unwrap().is_none());
}

#[test]
fn get_all_keeps_insertion_order() {
    let repo = InMemoryCustomerRepository::new();
    let names = ["Carla Dias", "Ana Souza", "Bruno Lima"];
    let documents = ["11111111111", "22222222222", "33333333333"];
    for (name, document) in names.iter().zip(documents) {
        repo.add(&complete_customer(name, document)).unwrap();
    }

    let listed: Vec<String> = repo
        .get_all()
        .unwrap()
        .iter()
        .map(|customer| customer.name().to_string())
        .collect();
    assert_eq!(listed, names);
}

#[test]
fn concurrent_adds_with_same_document_admit_exactly_one() {
    let repo = InMemoryCustomerRepository::new();

    let results: Vec<bool> = thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|index| {
                let repo = &repo;
                scope.spawn(move || {
                    let customer = complete_customer(&format!("Customer {index}"), "12345678901");
                    match repo.add(&customer) {
                        Ok(()) => true,
                        Err(RepoError::Conflict { .. }) => false,
                        Err(other) => panic!("unexpected error: {other}"),
                    }
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .collect()
    });

    assert_eq!(results.iter().filter(|added| **added).count(), 1);
    assert_eq!(repo.get_all().unwrap().len(), 1);
}

#[test]
fn first_owner_keeps_document_after_rejected_add() {
    let repo = InMemoryCustomerRepository::new();
    let mut first = complete_customer("Ana Souza", "12345678901");
    first
        .add_document(Document::create("111", "RG").unwrap())
        .unwrap();
    repo.add(&first).unwrap();

    let mut second = complete_customer("Bruno Lima", "98765432100");
    second
        .add_document(Document::create("111", "RG").unwrap())
        .unwrap();
    assert!(matches!(
        repo.add(&second),
        Err(RepoError::Conflict { ref document_number }) if document_number == "111"
    ));

    let owners: Vec<_> = repo
        .get_all()
        .unwrap()
        .into_iter()
        .filter(|customer| {
            customer
                .documents()
                .iter()
                .any(|document| document.number() == "111")
        })
        .map(|customer| customer.id())
        .collect();
    assert_eq!(owners, vec![first.id()]);
}
