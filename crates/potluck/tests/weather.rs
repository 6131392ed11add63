use anyhow::Result;
use potluck::configuration::{EnvMap, WeatherSettings};
use potluck::weather::WeatherClient;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_weather_from_settings() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/city"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([{"name": "Oslo", "latitude": 59.91, "longitude": 10.75}])),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/weather"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"temp": -3})))
        .expect(1)
        .mount(&server)
        .await;

    let mut env = EnvMap::new();
    env.insert("API_NINJAS_API_KEY".to_string(), "key".to_string());
    env.insert("API_NINJAS_HOST".to_string(), server.uri());

    let client = WeatherClient::new(WeatherSettings::from_source(&env)?.into_config())?;
    assert_eq!(
        client.get_weather("Oslo").await?,
        "Current temperature in Oslo is -3 degrees"
    );
    Ok(())
}
