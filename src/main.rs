use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Arg, ArgAction, Command};
use opentelemetry::trace::TracerProvider as _;
use opentelemetry_sdk::trace::{InMemorySpanExporter, SdkTracerProvider};
use opentelemetry_sdk::Resource;
use powertools::prelude::*;
use powertools::metrics::EmfRecorder;
use powertools::tracer::{InMemorySegmentProvider, SegmentProvider, TracingSegmentProvider};
use powertools::{init_diagnostics, DiagnosticsConfig};
use serde::Serialize;
use serde_json::json;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Debug, Serialize)]
struct OrderResponse {
    order_id: String,
    total: f64,
}

#[tokio::main]
async fn main() -> Result<()> {
    let matches = Command::new("powertools-demo")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Runs simulated function invocations through the logger, metrics and tracer")
        .arg(
            Arg::new("invocations")
                .short('n')
                .long("invocations")
                .value_name("COUNT")
                .help("Number of invocations to simulate")
                .value_parser(clap::value_parser!(u32))
                .default_value("3"),
        )
        .arg(
            Arg::new("service")
                .short('s')
                .long("service")
                .value_name("NAME")
                .help("Service name for all facades")
                .default_value("orders"),
        )
        .arg(
            Arg::new("namespace")
                .long("namespace")
                .value_name("NAMESPACE")
                .help("EMF namespace")
                .default_value("PowertoolsDemo"),
        )
        .arg(
            Arg::new("fail-every")
                .long("fail-every")
                .value_name("N")
                .help("Make every Nth invocation fail")
                .value_parser(clap::value_parser!(u32)),
        )
        .arg(
            Arg::new("otel")
                .long("otel")
                .help("Export subsegments as OpenTelemetry spans instead of the in-memory tree")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("log-level")
                .short('l')
                .long("log-level")
                .value_name("LEVEL")
                .help("Logger level")
                .value_parser(["DEBUG", "INFO", "WARN", "ERROR", "CRITICAL", "SILENT"])
                .default_value("INFO"),
        )
        .get_matches();

    let invocations = matches.get_one::<u32>("invocations").copied().unwrap_or(3);
    let service = matches
        .get_one::<String>("service")
        .cloned()
        .unwrap_or_else(|| "orders".to_string());
    let namespace = matches
        .get_one::<String>("namespace")
        .cloned()
        .unwrap_or_else(|| "PowertoolsDemo".to_string());
    let fail_every = matches.get_one::<u32>("fail-every").copied();
    let use_otel = matches.get_flag("otel");
    let level = matches
        .get_one::<String>("log-level")
        .map(String::as_str)
        .unwrap_or("INFO")
        .parse::<LogLevel>()?;

    let env = EnvironmentConfig::from_env();

    let exporter = if use_otel {
        Some(init_otel_diagnostics(&service)?)
    } else {
        init_diagnostics(DiagnosticsConfig::from_env(&env)).context("failed to install diagnostics")?;
        None
    };

    let logger = Logger::with_config(
        LoggerConfig::from_env(&env)?
            .with_service_name(service.clone())
            .with_level(level),
    )?;
    let metrics = Metrics::with_config(
        MetricsConfig::from_env(&env)
            .with_namespace(namespace)
            .with_service_name(service.clone()),
    )?;
    EmfRecorder::new(metrics.clone()).install()?;
    metrics::describe_histogram!("PricingLatency", metrics::Unit::Milliseconds, "time spent pricing an order");
    let memory_provider = InMemorySegmentProvider::from_env(&env);
    let provider: Arc<dyn SegmentProvider> = if use_otel {
        Arc::new(TracingSegmentProvider::from_env(&env))
    } else {
        Arc::new(memory_provider.clone())
    };
    let tracer = Tracer::with_provider(
        TracerConfig::from_env(&env)
            .with_service_name(service.clone())
            .with_handler_name("orders.handler"),
        provider,
    );

    logger.append_persistent_keys(json!({ "demo": true }));

    let chain = Powertools::new()
        .with_logger(logger.clone(), InjectContextOptions::default())
        .with_metrics(
            metrics.clone(),
            LogMetricsOptions {
                capture_cold_start_metric: true,
                ..LogMetricsOptions::default()
            },
        )
        .with_tracer(tracer.clone(), CaptureOptions::default());

    info!(invocations, service = %service, "Starting simulated invocations");

    for i in 1..=invocations {
        let ctx = LambdaContext::from_env(&env, uuid::Uuid::new_v4().to_string())
            .with_function_name(env.function_name().unwrap_or_else(|| "powertools-demo".to_string()));
        let event = json!({ "order_id": format!("order-{i}"), "items": i });
        let should_fail = fail_every.is_some_and(|n| n > 0 && i % n == 0);

        let result = chain
            .invoke(&event, &ctx, |event, _ctx| {
                handle_order(&logger, &metrics, &tracer, event, should_fail)
            })
            .await;

        match result {
            Ok(response) => info!(order_id = %response.order_id, "Invocation succeeded"),
            Err(e) => logger.error_with_cause("Invocation failed", &e),
        }

        for segment in memory_provider.drain_closed() {
            eprintln!("{}", serde_json::to_string(&segment)?);
        }
    }

    if let Some(exporter) = exporter {
        for span in exporter.get_finished_spans().context("failed to read exported spans")? {
            eprintln!("span {} with {} attributes", span.name, span.attributes.len());
        }
    }

    Ok(())
}

async fn handle_order(
    logger: &Logger,
    metrics: &Metrics,
    tracer: &Tracer,
    event: &serde_json::Value,
    should_fail: bool,
) -> PowertoolsResult<OrderResponse> {
    let order_id = event["order_id"].as_str().unwrap_or("unknown").to_string();
    let items = event["items"].as_u64().unwrap_or(0);

    logger.append_keys(json!({ "order_id": order_id }));
    logger.info("Processing order");
    tracer.put_annotation("order_id", order_id.clone())?;

    let started = std::time::Instant::now();
    let total = tracer
        .capture_method_async("price_order", CaptureOptions::default(), async {
            if should_fail {
                return Err(PowertoolsError::validation_error(format!(
                    "order {order_id} has no stock"
                )));
            }
            Ok(items as f64 * 9.99)
        })
        .await?;
    metrics::histogram!("PricingLatency").record(started.elapsed().as_secs_f64() * 1000.0);

    metrics.add_metric("OrdersPlaced", MetricUnit::Count, 1.0)?;
    metrics.add_metric("OrderTotal", MetricUnit::NoUnit, total)?;
    metrics.add_metadata("order_id", order_id.clone());
    logger.debug_with("Order priced", json!({ "total": total }));

    Ok(OrderResponse { order_id, total })
}

/// Diagnostics on stderr plus an OpenTelemetry layer exporting spans to memory.
fn init_otel_diagnostics(service: &str) -> Result<InMemorySpanExporter> {
    let exporter = InMemorySpanExporter::default();
    let provider = SdkTracerProvider::builder()
        .with_simple_exporter(exporter.clone())
        .with_resource(Resource::builder().with_service_name(service.to_string()).build())
        .build();
    let tracer = provider.tracer("powertools-demo");
    opentelemetry::global::set_tracer_provider(provider);

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .with(tracing_opentelemetry::layer().with_tracer(tracer))
        .try_init()
        .context("failed to install tracing subscriber")?;

    info!("OpenTelemetry span export enabled");
    Ok(exporter)
}
