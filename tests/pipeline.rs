use anyhow::Result;
use egenbefordring::{
    credentials::StaticCredentials,
    crypto::FernetEncryptor,
    fetch::LocalFolderFetch,
    process::NormalizedPaymentRecord,
    queue::{InMemoryQueue, WorkQueue},
    table::SpreadsheetReader,
    Config, Pipeline, RunArgs, RunSummary,
};
use fernet::Fernet;
use std::{collections::HashSet, fs, path::Path};
use tempfile::tempdir;

const CONFIG: &str = r#"
store:
  extension: ".csv"
  file_pattern: "Egenbe[forfart]*.csv"
  credential_account: svc-test
queue:
  name: test_queue
"#;

const CSV: &str = "test;cpr_nr;cpr_nr_paaanden;aendret_beloeb_i_alt;beloeb_i_alt;skoleliste;skriv_dit_barns_skole_eller_dagtilbud;attachments;godkendt;uuid;godkendt_af
\"[{'dato': '2024-03-01'}, {'dato': '2024-01-15'}]\";1111111111;2222222222;;100.00;Stensagerskolen 4B;;\"[{'url': 'https://bilag.example/a.pdf'}]\";X;abc-1;Hanne
\"[{'dato': '2024-03-01'}]\";3333333333;;75.5;60;Anden skole;Friskolen;;;abc-2;
not-a-literal;4444444444;;;10;;;;x;;
\"[{'dato': '2024-04-09'}]\";5555555555;;;1.234.5;Langagerskolen;;;godkendt x;;
";

fn write_share(dir: &Path) {
    fs::write(dir.join("Egenbefordring april.csv"), CSV).unwrap();
    fs::write(dir.join("ignore.txt"), "nope").unwrap();
}

async fn run_once(
    config: &Config,
    share: &Path,
    work: &Path,
    queue: &InMemoryQueue,
    encryptor: &FernetEncryptor,
) -> Result<RunSummary> {
    write_share(share);
    let creds = StaticCredentials::default().with("svc-test", "u", "p");
    let pipeline = Pipeline {
        config,
        credentials: &creds,
        fetch: &LocalFolderFetch::new(share, &config.store.extension),
        tables: &SpreadsheetReader { csv_delimiter: b';' },
        encryptor,
        queue,
    };
    let args = RunArgs {
        path: work.to_path_buf(),
        naeste_agent: "udbetaling".into(),
    };
    pipeline.run(&args).await
}

#[tokio::test]
async fn end_to_end_csv_run() -> Result<()> {
    let config = Config::from_yaml_str(CONFIG)?;
    let share = tempdir()?;
    let work = tempdir()?;
    let queue = InMemoryQueue::new();
    let enc = FernetEncryptor::new(&Fernet::generate_key())?;

    let summary = run_once(&config, share.path(), work.path(), &queue, &enc).await?;
    assert_eq!(summary.rows, 4);
    assert_eq!(summary.transformed, 3);
    assert_eq!(summary.failures.len(), 1);
    assert_eq!(summary.failures[0].index, 2);
    assert_eq!(summary.approved, 2);
    assert_eq!(summary.submitted, 2);

    let elements = queue.elements("test_queue");
    let records: Vec<NormalizedPaymentRecord> = elements
        .iter()
        .map(|e| serde_json::from_str(&e.data))
        .collect::<Result<_, _>>()?;

    let first = &records[0];
    assert_eq!(enc.decrypt(&first.encrypted_national_id)?, "2222222222");
    assert_eq!(first.amount.as_deref(), Some("100,00"));
    assert_eq!(first.reference, "Januar/Marts 2024");
    assert_eq!(first.posting_text, "Egenbefordring Januar/Marts 2024");
    assert_eq!(first.cost_center, "XG-5240220808-00005");
    assert_eq!(first.attachment_url.as_deref(), Some("https://bilag.example/a.pdf"));
    assert_eq!(first.uuid.as_deref(), Some("abc-1"));
    assert_eq!(first.approved_by.as_deref(), Some("Hanne"));
    assert_eq!(first.school.as_deref(), Some("Stensagerskolen 4B"));
    assert_eq!(first.next_agent, "udbetaling");
    assert!(first.approved);

    let second = &records[1];
    assert_eq!(second.amount.as_deref(), Some("1234,5"));
    assert_eq!(second.cost_center, "XG-5240220808-00004");
    assert_eq!(second.reference, "April 2024");
    Ok(())
}

#[tokio::test]
async fn reruns_clear_the_queue_and_never_collide() -> Result<()> {
    let config = Config::from_yaml_str(CONFIG)?;
    let share = tempdir()?;
    let work = tempdir()?;
    let queue = InMemoryQueue::new();
    let enc = FernetEncryptor::new(&Fernet::generate_key())?;

    run_once(&config, share.path(), work.path(), &queue, &enc).await?;
    let first: HashSet<String> = queue
        .elements("test_queue")
        .into_iter()
        .map(|e| e.reference)
        .collect();
    run_once(&config, share.path(), work.path(), &queue, &enc).await?;
    let second: HashSet<String> = queue
        .elements("test_queue")
        .into_iter()
        .map(|e| e.reference)
        .collect();

    assert_eq!(second.len(), 2);
    assert!(first.is_disjoint(&second));

    // Resubmitting the same logical batch on top of the old one still succeeds.
    let payload = queue.elements("test_queue")[0].data.clone();
    let base = "Egenbefordring Januar/Marts 2024".to_string();
    let refs = egenbefordring::process::make_unique_references(&[base.clone(), base]);
    queue
        .bulk_create("test_queue", &refs, &[payload.clone(), payload])
        .await?;
    assert_eq!(queue.elements("test_queue").len(), 4);
    Ok(())
}
