use enhencer::FileSettingsStore;

pub fn main() {
    env_logger::init();

    let token = std::env::var("ENHENCER_TOKEN").unwrap();
    let settings = FileSettingsStore::open("enhencer-settings.json").unwrap();

    let client = enhencer::ClientConfig::from_token(token)
        .settings_store(settings)
        .os_version(std::env::consts::OS)
        .audience_logger(|name: &str, value: f64| {
            println!("Audience: {} ({})", name, value);
        })
        .to_client()
        .unwrap();

    println!("Visitor: {}", client.visitor_id().unwrap());

    // Each call posts the event, posts the customer record, then re-scores the visitor.
    client.listing_page("shoes", "sneakers").unwrap();
    client.product_page("sneakers", "p1", 100).unwrap();
    client.add_to_basket("p1").unwrap();
    client.purchase().unwrap();
}
