use cookie_consent::{
    bridge::{BroadcastRegistry, ConsentChangedArgs, ConsentEvent, ConsentEventHandler, ContextKind},
    config::{Category, ConsentConfig, Service},
    cookies::{CookieAccessHandle, DefaultCookieJar, JarCookieAccess, UnavailableCookieAccess},
    dom::{Document, ScriptHostHandle},
    interface::{ConsentInterface, Localizer, PromptAction},
    service::{ConsentService, ServiceRole},
    ConsentError,
};
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use url::Url;

const PAGE: &str = r#"<html><head>
<script type="text/plain" data-consent-category="analytics" id="ga" data-src="https://www.googletagmanager.com/gtag/js"></script>
<script type="text/plain" data-consent-category="marketing" data-consent-service="ads">loadAds();</script>
</head><body><h1>Shop</h1></body></html>"#;

#[tokio::main]
async fn main() -> Result<(), ConsentError> {
    env_logger::init();

    // Configure the policy through the builder. Every category gets its
    // services so that allowing a category allows all of them too.
    let config = Arc::new(
        ConsentConfig::builder()
            .revision(3)
            .category(
                Category::new("analytics")
                    .title("en", "Analytics")
                    .service(Service::new("google-analytics").title("en", "Google Analytics")),
            )
            .category(
                Category::new("marketing")
                    .title("en", "Marketing")
                    .service(Service::new("ads").title("en", "Ad network")),
            )
            .build()
            .expect("Configuration is not valid"),
    );

    // Both contexts share one registry. The server prerenders and cannot
    // touch cookies; the client owns the page and the cookie jar.
    let registry = Arc::new(BroadcastRegistry::new());
    let server_handler = Arc::new(ConsentEventHandler::new(ContextKind::Server, false, registry.clone()));
    let client_handler = Arc::new(ConsentEventHandler::new(ContextKind::Client, true, registry.clone()));

    // Messages sent before this point would simply be dropped.
    server_handler.initialize();
    client_handler.initialize();

    let jar = Arc::new(RwLock::new(DefaultCookieJar::new()));
    let cookies: CookieAccessHandle = Arc::new(JarCookieAccess::new(
        jar,
        Url::parse("https://shop.example/").expect("valid url"),
    ));
    let document = Arc::new(RwLock::new(Document::parse(PAGE)));
    let scripts: ScriptHostHandle = document.clone();

    let server = Arc::new(ConsentService::new(
        config.clone(),
        Arc::new(UnavailableCookieAccess),
        None,
        server_handler,
        ServiceRole::Proxy,
    ));
    let client = Arc::new(ConsentService::new(
        config.clone(),
        cookies,
        Some(scripts),
        client_handler,
        ServiceRole::Authority,
    ));

    // Listeners on the server side learn about category changes through the bridge.
    server.add_listener(Arc::new(|change: &ConsentChangedArgs| -> anyhow::Result<()> {
        println!(
            "[server] category {} -> {:?} (initial: {})",
            change.category, change.changed_to, change.is_initial_change
        );
        Ok(())
    }));
    let server_loop = server.spawn_bridge_listener().expect("server handler initialized");
    let client_loop = client.spawn_bridge_listener().expect("client handler initialized");

    let mut client_events = client.subscribe();

    // First render in the browser: notifies the service and decides whether
    // the prompt must be shown.
    let mut ui = ConsentInterface::new(client.clone());
    ui.on_first_render().await;

    let localizer = Localizer::for_config(&config, "en");
    println!(
        "[client] prompt visible: {} ({})",
        ui.is_showing_consent_modal(),
        localizer.localize(&config.texts.consent_title)?
    );

    // The user opens the preferences modal and enables analytics only.
    let mut selection = ui
        .on_action(PromptAction::OpenPreferences)
        .await
        .expect("preferences selection");
    let analytics = config.category("analytics").ok_or_else(|| ConsentError::UnknownCategory("analytics".into()))?;
    selection.toggle(analytics, true);
    selection.allow_selected(&client).await;
    ui.close_preferences(true);

    // A server-rendered component asks for the preferences modal; the
    // request is forwarded to the client, which renders the UI.
    server.show_preferences_modal().await;

    tokio::time::sleep(Duration::from_millis(50)).await;
    while let Ok(event) = client_events.try_recv() {
        match &event {
            ConsentEvent::ScriptLoaded(args) => println!("[client] script loaded: {}", args.script.id),
            ConsentEvent::ShowPreferencesModalRequested => {
                ui.handle_event(&event);
                println!("[client] preferences modal requested");
            }
            _ => {}
        }
    }

    let loaded = client.loaded_scripts(CancellationToken::new()).await?;
    println!("[client] loaded scripts: {:?}", loaded.iter().map(|s| &s.id).collect::<Vec<_>>());
    println!("[client] page now:\n{}", document.read().expect("document lock").to_html());
    println!(
        "[server] marketing allowed: {}",
        server.is_category_allowed("marketing").await
    );

    // Dropping the registrations ends both receive loops.
    registry.unregister(ContextKind::Server);
    registry.unregister(ContextKind::Client);
    let _ = server_loop.await;
    let _ = client_loop.await;

    Ok(())
}
