//! End-to-end scenarios against a real headless Chromium, driven from
//! synthetic fixture pages on disk. Run with `--ignored` on machines with a
//! Chrome/Chromium executable available.

use std::path::Path;
use std::time::Duration;

use pagecap_lib::{
    BrowserSession, CaptureTarget, Config, DisclosureController, DisclosureSelectors,
    ElementLocator, JobRequest, JobRunner, JobStore, LocatorTimeouts, SearchContext,
    SessionOptions,
};
use tempfile::TempDir;
use url::Url;

fn write_fixture(dir: &Path, name: &str, html: &str) -> Url {
    let path = dir.join(name);
    std::fs::write(&path, html).expect("write fixture");
    Url::from_file_path(&path).expect("file url")
}

const ACCORDION_FIXTURE: &str = r##"<!doctype html>
<html>
<head>
<meta charset="utf-8">
<style>
  div.ac-detail { display: none; }
  div.ac-title.active + div.ac-detail { display: block; }
</style>
</head>
<body>
  <div class="ac-title"><a href="#">Accordion Title X</a></div>
  <div class="ac-detail"><div style="width:400px;background:#eee;padding:8px;">content block</div></div>
  <script>
    document.querySelectorAll('div.ac-title a').forEach(a => {
      a.addEventListener('click', e => {
        e.preventDefault();
        const row = a.closest('div.ac-title');
        row.setAttribute('data-clicks', String(Number(row.getAttribute('data-clicks') || '0') + 1));
        row.classList.add('active');
      });
    });
  </script>
</body>
</html>"##;

fn fast_locator_timeouts() -> LocatorTimeouts {
    LocatorTimeouts {
        element_wait: Duration::from_secs(1),
        frame_wait: Duration::from_secs(1),
        ..LocatorTimeouts::default()
    }
}

#[tokio::test]
#[ignore = "requires a local Chrome/Chromium executable"]
async fn locator_finds_input_three_iframes_deep() {
    let tmp = TempDir::new().expect("tempdir");

    write_fixture(tmp.path(), "empty.html", "<!doctype html><html><body></body></html>");
    write_fixture(
        tmp.path(),
        "level3.html",
        "<!doctype html><html><body><input type=\"file\" id=\"deep\"></body></html>",
    );
    write_fixture(
        tmp.path(),
        "level2.html",
        "<!doctype html><html><body><iframe src=\"level3.html\"></iframe></body></html>",
    );
    write_fixture(
        tmp.path(),
        "level1.html",
        "<!doctype html><html><body><iframe src=\"level2.html\"></iframe></body></html>",
    );
    let top = write_fixture(
        tmp.path(),
        "top.html",
        r#"<!doctype html><html><body>
          <iframe src="empty.html"></iframe>
          <iframe src="empty.html"></iframe>
          <iframe src="level1.html"></iframe>
        </body></html>"#,
    );

    // file:// documents are isolated origins by default; the fixture frames
    // must be reachable from the parent for the scan to enter them.
    let session = BrowserSession::launch(SessionOptions {
        extra_args: vec!["--allow-file-access-from-files".to_string()],
        ..SessionOptions::default()
    })
    .await
    .expect("launch browser");
    session.navigate(top.as_str()).await.expect("navigate");

    let locator = ElementLocator::new(session.source().clone(), fast_locator_timeouts());
    let located = locator
        .locate("input[type='file']")
        .await
        .expect("input should be found in a nested frame");

    assert_eq!(
        located.context(),
        &SearchContext::Frame(vec![2, 0, 0]),
        "the input is absent from the top document and the first two frames"
    );

    session.close().await;
}

#[tokio::test]
#[ignore = "requires a local Chrome/Chromium executable"]
async fn deep_mode_pierces_shadow_roots() {
    let tmp = TempDir::new().expect("tempdir");
    let page = write_fixture(
        tmp.path(),
        "shadow.html",
        r#"<!doctype html><html><body>
          <div id="host"></div>
          <script>
            const root = document.getElementById('host').attachShadow({mode: 'open'});
            root.innerHTML = '<input type="file" id="hidden-upload">';
          </script>
        </body></html>"#,
    );

    let session = BrowserSession::launch(SessionOptions::default())
        .await
        .expect("launch browser");
    session.navigate(page.as_str()).await.expect("navigate");

    let locator = ElementLocator::new(session.source().clone(), fast_locator_timeouts());
    assert!(
        locator.locate("input[type='file']").await.is_err(),
        "the ordinary query must miss the shadow tree"
    );
    let located = locator
        .locate_deep("input[type='file']")
        .await
        .expect("deep mode should reach into the shadow root");
    assert!(located.context().is_top());

    session.close().await;
}

#[tokio::test]
#[ignore = "requires a local Chrome/Chromium executable"]
async fn disclosure_open_is_idempotent() {
    let tmp = TempDir::new().expect("tempdir");
    let page = write_fixture(tmp.path(), "accordion.html", ACCORDION_FIXTURE);

    let session = BrowserSession::launch(SessionOptions::default())
        .await
        .expect("launch browser");
    session.navigate(page.as_str()).await.expect("navigate");

    let locator = ElementLocator::new(session.source().clone(), fast_locator_timeouts());
    let controller = DisclosureController::new(
        locator.clone(),
        DisclosureSelectors::default(),
        Duration::from_secs(5),
        Duration::from_secs(5),
    );

    let first = controller.open("Accordion Title X").await.expect("first open");
    assert!(controller.is_open(&first).await);

    let second = controller.open("Accordion Title X").await.expect("second open");
    assert!(controller.is_open(&second).await);

    // Exactly one click interaction across both opens.
    let one_click = locator
        .probe("(() => document.querySelector('div.ac-title').getAttribute('data-clicks') === '1')()")
        .await;
    assert!(one_click, "second open must not click again");

    session.close().await;
}

#[tokio::test]
#[ignore = "requires a local Chrome/Chromium executable"]
async fn accordion_capture_produces_all_three_artifacts() {
    let tmp = TempDir::new().expect("tempdir");
    let page = write_fixture(tmp.path(), "accordion.html", ACCORDION_FIXTURE);
    let out_dir = tmp.path().join("out");

    let store = JobStore::new();
    let runner = JobRunner::new(store.clone(), Config::default());
    let id = runner.submit(JobRequest {
        url: page.to_string(),
        targets: vec![CaptureTarget::accordion("A", "Accordion Title X")],
        out_dir: out_dir.clone(),
    });

    let deadline = tokio::time::Instant::now() + Duration::from_secs(120);
    while !store.status_view(&id).done {
        assert!(tokio::time::Instant::now() < deadline, "job timed out");
        tokio::time::sleep(Duration::from_millis(200)).await;
    }

    let record = store.get(&id).expect("record");
    assert!(record.error.is_none(), "job error: {:?}", record.error);
    let summary = record.summary.expect("summary");
    assert_eq!(summary.captured, 1);
    assert_eq!(summary.failed, 0);

    for rel in ["renders/html/a.html", "renders/png/a.png", "renders/jpg/a.jpg"] {
        let path = out_dir.join(rel);
        let meta = std::fs::metadata(&path)
            .unwrap_or_else(|_| panic!("missing artifact {}", path.display()));
        assert!(meta.len() > 0, "empty artifact {}", path.display());
    }

    // 400px content against an 1100px target width: no upscaling, and both
    // rasters reference the identical captured bounding box.
    let png = image::open(out_dir.join("renders/png/a.png")).expect("decode png");
    let jpg = image::open(out_dir.join("renders/jpg/a.jpg")).expect("decode jpg");
    use image::GenericImageView;
    assert_eq!(png.dimensions(), jpg.dimensions());
    let (w, _) = png.dimensions();
    assert!(w <= 1100 * 2, "capture wider than the unscaled content allows");
}

#[tokio::test]
#[ignore = "requires a local Chrome/Chromium executable"]
async fn unresolvable_selector_fails_locally_but_job_succeeds() {
    let tmp = TempDir::new().expect("tempdir");
    let page = write_fixture(tmp.path(), "accordion.html", ACCORDION_FIXTURE);
    let out_dir = tmp.path().join("out");

    let mut config = Config::default();
    config.timeouts.element_wait = Duration::from_secs(1);
    config.timeouts.frame_wait = Duration::from_millis(500);

    let store = JobStore::new();
    let runner = JobRunner::new(store.clone(), config);
    let id = runner.submit(JobRequest {
        url: page.to_string(),
        targets: vec![
            CaptureTarget::accordion("A", "Accordion Title X"),
            CaptureTarget::selector("B", "div.never-resolves"),
        ],
        out_dir,
    });

    let deadline = tokio::time::Instant::now() + Duration::from_secs(120);
    while !store.status_view(&id).done {
        assert!(tokio::time::Instant::now() < deadline, "job timed out");
        tokio::time::sleep(Duration::from_millis(200)).await;
    }

    let record = store.get(&id).expect("record");
    assert!(record.error.is_none(), "a failed target is not a job failure");
    let summary = record.summary.expect("summary");
    assert_eq!(summary.captured, 1);
    assert_eq!(summary.failed, 1);

    let failed = summary.results.iter().find(|r| r.title == "B").expect("B result");
    assert!(!failed.ok);
    let error = failed.error.as_deref().unwrap_or_default();
    assert!(
        error.contains("not found"),
        "expected 'not found' in error, got: {error}"
    );
}
