//! One renderer per page. Each loads what it needs (best effort), shapes it
//! through the model layer, and returns the HTML for the `<main>` element.

use crate::Result;
use crate::artifacts::{
    Cell, DisplayRequest, GroupsMetadata, Instance, Prediction, RunSpec, Scenario, Schema,
    ScenarioState, Stat, Summary, Table,
};
use crate::format::{self, escape_html, render_markdown};
use crate::model::instances::{self, InstanceView};
use crate::model::{
    InstanceSet, MetricJudgements, PredictionContext, SortOrder, landing, metrics, runs, tables,
};
use crate::params::UrlParams;
use crate::render::html::{
    anchor, error_block, fragment, header, help_icon, link, link_titled, placeholder,
    render_document, td, tr,
};
use crate::route::{Page, RunSpecSelector, check_path_component};
use crate::store::{SiteConfig, Store};

use tracing::{debug, error, info};

/// Shared inputs of every page.
pub struct PageContext<'a> {
    pub store: &'a Store,
    pub schema: &'a Schema,
    pub params: &'a UrlParams,
}

/// Render the page selected by `params` as a complete HTML document.
///
/// Only an unreadable schema is fatal; everything else degrades to a
/// placeholder on the page.
pub fn render_page(config: &SiteConfig, params: &UrlParams) -> Result<String> {
    // The suite names a directory; a bad one falls back to the default and
    // shows the error page.
    let checked_suite = check_path_component("suite", params.suite(&config.default_suite));
    let suite = match &checked_suite {
        Ok(s) => s.clone(),
        Err(_) => config.default_suite.clone(),
    };
    info!("suite: {}", suite);
    let store = Store::new(config, &suite);
    let schema = store.load_schema()?;

    let summary_html = match store.load_optional::<Summary>(&store.summary_href()) {
        Some(s) => escape_html(&format!("{} (last updated {})", s.suite, s.date)),
        None => escape_html(&suite),
    };

    let ctx = PageContext {
        store: &store,
        schema: &schema,
        params,
    };

    let (title, main_html) = match checked_suite.and_then(|_| Page::from_params(params)) {
        Ok(page) => {
            debug!("page: {:?}", page);
            render_main(&ctx, &page)
        }
        Err(e) => {
            error!("bad query: {:#}", e);
            ("Error".to_string(), error_block(&format!("{:#}", e)))
        }
    };

    Ok(render_document(
        &title,
        &summary_html,
        &nav(params),
        &main_html,
    ))
}

fn render_main(ctx: &PageContext<'_>, page: &Page) -> (String, String) {
    match page {
        Page::Landing => ("Benchmark results".to_string(), render_landing(ctx)),
        Page::Models => ("Models".to_string(), header("Models", &render_models(ctx))),
        Page::Scenarios => (
            "Scenarios".to_string(),
            header("Scenarios", &render_scenarios(ctx)),
        ),
        Page::RunsOverview => ("Runs".to_string(), header("Runs", &render_runs_overview(ctx))),
        Page::RunsDetailed(selector) => ("Runs".to_string(), render_runs_detailed(ctx, selector)),
        Page::Groups => {
            let href = ctx.store.groups_href();
            ("Groups".to_string(), render_tables_from(ctx, &href))
        }
        Page::Group { name, subgroup } => {
            let href = ctx.store.group_href(name);
            let mut html = render_group_header(ctx, name, subgroup.as_deref());
            html.push_str(&render_tables_from(ctx, &href));
            (name.clone(), html)
        }
        Page::Latex(name) => (name.clone(), render_latex(ctx, name)),
    }
}

fn nav(params: &UrlParams) -> String {
    let base = match params.get("suite") {
        Some(s) => UrlParams::default().with([("suite", Some(s))]),
        None => UrlParams::default(),
    };
    [
        link(&base.encode(), "Home"),
        link(&base.with([("models", Some("1"))]).encode(), "Models"),
        link(&base.with([("scenarios", Some("1"))]).encode(), "Scenarios"),
        link(&base.with([("runs", Some("1"))]).encode(), "Runs"),
        link(&base.with([("groups", Some("1"))]).encode(), "Groups"),
    ]
    .concat()
}

fn group_url(params: &UrlParams, group: &str) -> String {
    params
        .with([("scenarios", None), ("group", Some(group))])
        .encode()
}

/// Hidden inputs carrying every parameter but `except`, so a GET form keeps the page.
fn hidden_inputs(params: &UrlParams, except: &str) -> String {
    params
        .iter()
        .filter(|(k, _)| *k != except)
        .map(|(k, v)| {
            format!(
                "<input type=\"hidden\" name=\"{}\" value=\"{}\">",
                escape_html(k),
                escape_html(v)
            )
        })
        .collect()
}

fn search_form(params: &UrlParams, name: &str, placeholder_text: &str) -> String {
    format!(
        "<form method=\"get\">{}<input type=\"text\" size=\"40\" name=\"{}\" value=\"{}\" placeholder=\"{}\"></form>",
        hidden_inputs(params, name),
        name,
        escape_html(params.get(name).unwrap_or("")),
        escape_html(placeholder_text)
    )
}

/////////////////////////////////// Landing ////////////////////////////////////

fn render_landing(ctx: &PageContext<'_>) -> String {
    let schema = ctx.schema;
    let params = ctx.params;
    let mut out = String::new();

    out.push_str("<div><h2>");
    out.push_str(&link(&UrlParams::default().encode(), "Benchmark results"));
    out.push_str("</h2><p>Every scenario, prediction, prompt and metric of the evaluation is browsable below.</p></div>");
    out.push_str("<div class=\"columns\">");

    // Models
    out.push_str("<div>");
    out.push_str(&format!(
        "<div class=\"list-header\">{} models</div>",
        landing::model_count(schema)
    ));
    let models_href = params
        .with([("scenarios", None), ("models", Some("1"))])
        .encode();
    for model in &schema.models {
        let class = if model.todo { "list-item list-item-todo" } else { "list-item" };
        let text = format!("{} / {}", model.creator_organization, model.display_name);
        out.push_str(&format!(
            "<div>{}</div>",
            link_titled(&models_href, &model.description, class, &escape_html(&text))
        ));
    }
    out.push_str("</div>");

    // Scenarios
    let scenarios = landing::scenario_list(schema);
    out.push_str("<div>");
    out.push_str(&format!(
        "<div class=\"list-header\">{} scenarios</div>",
        scenarios.count
    ));
    for (group, subgroups) in &scenarios.top_groups {
        out.push_str("<div>");
        out.push_str(&link_titled(
            &group_url(params, &group.name),
            &group.description,
            "list-item",
            &escape_html(group.short_name()),
        ));
        out.push_str("<ul>");
        for sub in subgroups {
            let class = if sub.todo { "list-item list-item-todo" } else { "list-item" };
            out.push_str(&format!(
                "<li>{}</li>",
                link_titled(
                    &group_url(params, &sub.name),
                    &sub.description,
                    class,
                    &escape_html(sub.short_name())
                )
            ));
        }
        out.push_str("</ul></div>");
    }
    out.push_str("</div>");

    // Metrics
    let metric_list = landing::metric_list(schema);
    out.push_str("<div>");
    out.push_str(&format!(
        "<div class=\"list-header\">{} metrics</div>",
        metric_list.count
    ));
    for (group, items) in &metric_list.groups {
        let display = group.display_name.as_deref().unwrap_or(&group.name);
        let href = format!(
            "{}{}",
            params.with([("group", Some("core_scenarios"))]).encode(),
            fragment(display)
        );
        out.push_str("<div>");
        out.push_str(&link_titled(
            &href,
            &group.description,
            "list-item",
            &escape_html(group.short_name()),
        ));
        out.push_str("<ul>");
        for item in items {
            out.push_str(&format!(
                "<li><span class=\"list-item\" title=\"{}\">{}</span></li>",
                escape_html(&item.description),
                escape_html(&item.display)
            ));
        }
        out.push_str("</ul></div>");
    }
    out.push_str("</div>");

    out.push_str("</div>");
    out
}

//////////////////////////////// Models, scenarios /////////////////////////////

fn render_models(ctx: &PageContext<'_>) -> String {
    let mut rows = vec![format!(
        "<thead>{}</thead>",
        tr(&[
            td("Creator"),
            td("Model"),
            td("Description"),
            td("Access"),
        ])
    )];
    for model in &ctx.schema.models {
        let name = format!(
            "<div>{}</div><div class=\"technical-details\">{}</div>",
            escape_html(&model.display_name),
            escape_html(&model.name)
        );
        rows.push(tr(&[
            td(&escape_html(&model.creator_organization)),
            td(&name),
            td(&render_markdown(&model.description)),
            td(&escape_html(&model.access)),
        ]));
    }
    format!(
        "<table class=\"query-table results-table\">{}</table>",
        rows.concat()
    )
}

fn render_scenarios(ctx: &PageContext<'_>) -> String {
    let mut rows = vec![format!(
        "<thead>{}</thead>",
        tr(&[
            td("Scenario"),
            td("Task"),
            td("What"),
            td("When"),
            td("Who"),
            td("Language"),
            td("Description"),
        ])
    )];
    for group in &ctx.schema.run_groups {
        if group.category.is_some() {
            continue;
        }
        let name = format!(
            "<div>{}</div><div class=\"technical-details\">{}</div>",
            link(
                &group_url(ctx.params, &group.name),
                &escape_html(group.display_name())
            ),
            escape_html(&group.name)
        );
        let taxonomy = group.taxonomy.clone().unwrap_or_default();
        let cell = |v: &Option<String>| td(&escape_html(v.as_deref().unwrap_or("")));
        rows.push(tr(&[
            td(&name),
            cell(&taxonomy.task),
            cell(&taxonomy.what),
            cell(&taxonomy.when),
            cell(&taxonomy.who),
            cell(&taxonomy.language),
            td(&render_markdown(&group.description)),
        ]));
    }
    format!(
        "<table class=\"query-table results-table\">{}</table>",
        rows.concat()
    )
}

/////////////////////////////////// Runs ///////////////////////////////////////

fn load_run_specs(ctx: &PageContext<'_>) -> Option<Vec<RunSpec>> {
    let run_specs: Option<Vec<RunSpec>> = ctx.store.load_optional(&ctx.store.run_specs_href());
    if let Some(r) = &run_specs {
        debug!("loaded {} run specs", r.len());
    }
    run_specs
}

fn render_runs_overview(ctx: &PageContext<'_>) -> String {
    let Some(run_specs) = load_run_specs(ctx) else {
        return placeholder("Runs are currently unavailable.");
    };
    let query = ctx.params.get("query").unwrap_or("");

    let mut out = search_form(ctx.params, "query", "Enter regex query");
    if !query.is_empty() {
        let pattern = format!(".*{}.*", query);
        let href = ctx
            .params
            .with([("query", None), ("runSpecRegex", Some(pattern.as_str()))])
            .encode();
        out.push_str(&format!("<div>{}</div>", link(&href, "Open all matching runs")));
    }

    let mut rows = vec![tr(&[td("<b>Run</b>"), td("<b>Adaptation method</b>")])];
    for run_spec in runs::filter_runs(&run_specs, query) {
        let href = ctx
            .params
            .with([("query", None), ("runSpec", Some(run_spec.name.as_str()))])
            .encode();
        rows.push(tr(&[
            td(&link(&href, &escape_html(&run_spec.name))),
            td(&escape_html(run_spec.method())),
        ]));
    }
    out.push_str(&format!("<table class=\"query-table\">{}</table>", rows.concat()));
    out
}

fn render_runs_detailed(ctx: &PageContext<'_>, selector: &RunSpecSelector) -> String {
    let Some(run_specs) = load_run_specs(ctx) else {
        return placeholder("Runs are currently unavailable.");
    };
    let matched = runs::select_runs(&run_specs, selector);
    if matched.is_empty() {
        return error_block("No matching runs");
    }
    info!("rendering {} runs", matched.len());

    let display_names = if matched.len() > 1 {
        runs::run_display_names(&matched)
    } else {
        Vec::new()
    };
    let names_row = || {
        let mut cells = vec![td("")];
        cells.extend(display_names.iter().map(|n| td(&escape_html(n))));
        tr(&cells)
    };

    let mut out = String::new();
    out.push_str(&render_runs_header(ctx, &matched[0]));

    // Adapter
    out.push_str(&anchor("adapter", "<h5>Adapter specification</h5>"));
    out.push_str("<div class=\"table-container\"><table>");
    if matched.len() > 1 {
        out.push_str(&names_row());
    }
    let mut link_cells = vec![td("")];
    for run in &matched {
        link_cells.push(td(&format!(
            "{} | {}",
            link(&ctx.store.run_spec_href(&run.name), "Spec JSON"),
            link(&ctx.store.scenario_state_href(&run.name), "Full JSON")
        )));
    }
    out.push_str(&tr(&link_cells));
    for row in runs::adapter_rows(ctx.schema, &matched) {
        let mut cells = vec![td(&format!(
            "<span>{} {}</span>",
            help_icon(&row.help),
            escape_html(&row.key)
        ))];
        for v in &row.values {
            let text = escape_html(&v.text);
            cells.push(td(&match &v.title {
                Some(t) => format!("<span title=\"{}\">{}</span>", escape_html(t), text),
                None => text,
            }));
        }
        out.push_str(&tr(&cells));
    }
    out.push_str("</table></div>");

    // Instances
    out.push_str(&anchor("instances", "<h5>Instances + predictions</h5>"));
    out.push_str("<div class=\"table-container\">");
    out.push_str(&render_instances(ctx, &matched, &display_names));
    out.push_str("</div>");

    // Metrics
    out.push_str(&anchor("metrics", "<h5>All metrics</h5>"));
    out.push_str("<div class=\"table-container\">");
    let stats_hrefs: Vec<String> = matched
        .iter()
        .map(|r| ctx.store.stats_href(&r.name))
        .collect();
    let stats_per_run: Vec<Vec<Stat>> = ctx.store.load_list(&stats_hrefs, Vec::new());
    if metrics::stats_unavailable(&stats_per_run) {
        out.push_str(&placeholder(
            "Metrics are currently unavailable. Please try again later.",
        ));
    } else {
        let query = ctx.params.get("metricsQuery").unwrap_or("");
        out.push_str(&search_form(
            ctx.params,
            "metricsQuery",
            "Enter keywords to filter metrics",
        ));
        out.push_str("<table>");
        if matched.len() > 1 {
            out.push_str(&names_row());
        }
        let keys = metrics::stat_keys(&stats_per_run);
        for row in metrics::stats_rows(ctx.schema, &keys, &stats_per_run, query) {
            let mut cells = vec![td(&format!(
                "<span>{} {}</span>",
                help_icon(&row.help),
                row.label
            ))];
            cells.extend(row.values.iter().map(|v| td(&escape_html(v))));
            out.push_str(&tr(&cells));
        }
        let mut json_cells = vec![td("")];
        json_cells.extend(stats_hrefs.iter().map(|h| td(&link(h, "JSON"))));
        out.push_str(&tr(&json_cells));
        out.push_str("</table>");
    }
    out.push_str("</div>");

    out
}

fn render_runs_header(ctx: &PageContext<'_>, first: &RunSpec) -> String {
    let scenario_href = ctx.store.scenario_href(&first.name);
    let scenario: Option<Scenario> = ctx.store.load_optional(&scenario_href);

    let mut out = String::from("<div class=\"scenario-info\">");
    let mut links = Vec::new();
    match &scenario {
        Some(s) => {
            let title = if s.name.is_empty() {
                first.scenario_spec.render()
            } else {
                s.name.clone()
            };
            out.push_str(&format!(
                "<h3>{} <span class=\"technical-details\">{}</span></h3>",
                escape_html(&title),
                escape_html(&first.scenario_spec.render())
            ));
            out.push_str(&format!("<div><i>{}</i></div>", render_markdown(&s.description)));
            links.push(link(&s.definition_path, "Code"));
        }
        None => {
            out.push_str(&format!(
                "<h3>{}</h3>",
                escape_html(&first.scenario_spec.render())
            ));
            out.push_str(&placeholder("Scenario info unavailable."));
        }
    }
    links.push(link(&scenario_href, "Scenario JSON"));
    links.push(link("#adapter", "Adapter specification"));
    links.push(link("#instances", "Instances + predictions"));
    links.push(link("#metrics", "All metrics"));
    out.push_str(&format!("<div>{}</div>", format::render_items(&links)));
    out.push_str("</div>");
    out
}

/// Predictions and requests of one run, from the display files or, for older
/// suites, from the scenario state.
fn load_predictions(ctx: &PageContext<'_>, run: &RunSpec) -> (Vec<Prediction>, Vec<DisplayRequest>) {
    let store = ctx.store;
    let predictions_href = store.predictions_href(&run.name);
    if store.exists(&predictions_href) {
        let predictions: Vec<Prediction> = store.load_or_default(&predictions_href);
        let requests_href = store.requests_href(&run.name);
        let requests: Vec<DisplayRequest> = if store.exists(&requests_href) {
            store.load_or_default(&requests_href)
        } else {
            Vec::new()
        };
        return (predictions, requests);
    }

    let state_href = store.scenario_state_href(&run.name);
    match store.load_optional::<ScenarioState>(&state_href) {
        Some(state) => instances::from_scenario_state(&state),
        None => (Vec::new(), Vec::new()),
    }
}

fn render_instances(ctx: &PageContext<'_>, matched: &[RunSpec], display_names: &[String]) -> String {
    let instances_href = ctx.store.instances_href(&matched[0].name);
    let Some(instances) = ctx.store.load_optional::<Vec<Instance>>(&instances_href) else {
        return placeholder("Instances are currently unavailable.");
    };

    let hide = ctx.params.is_set("hideInputOutput");
    let mut set = InstanceSet::build(&instances, hide);
    debug!("{} instances", set.len());

    let judgements = MetricJudgements::from_schema(ctx.schema);
    for (i, run) in matched.iter().enumerate() {
        let metric_names = metrics::run_metric_names(ctx.schema, run);
        let pctx = PredictionContext {
            schema: ctx.schema,
            run_spec: run,
            run_index: i,
            run_display_name: display_names.get(i).map(String::as_str),
            metric_names: &metric_names,
            judgements: &judgements,
        };
        let (predictions, requests) = load_predictions(ctx, run);
        set.attach_predictions(&pctx, &predictions);
        set.attach_requests(i, &requests);
    }

    set.views.iter().map(render_instance).collect()
}

fn render_instance(view: &InstanceView) -> String {
    let mut out = String::new();
    out.push_str(if view.perturbed { "<br>" } else { "<hr>" });
    out.push_str("<div class=\"instance\">");
    out.push_str(&format!("<b>{}</b>", escape_html(&view.header)));

    if let Some(input) = &view.input_html {
        out.push_str("<div>Input:</div>");
        out.push_str(&format!("<div class=\"instance-input\">{}</div>", input));
        if !view.references.is_empty() {
            let label = if view.references.len() == 1 {
                "Reference:"
            } else {
                "References:"
            };
            out.push_str(&format!("<div>{}</div><ul>", label));
            for r in &view.references {
                let suffix = if r.tags.is_empty() {
                    String::new()
                } else {
                    format!(" <b>[{}]</b>", escape_html(&r.tags.join(",")))
                };
                out.push_str(&format!(
                    "<li><span class=\"instance-reference\">{}</span>{}</li>",
                    r.output_html, suffix
                ));
            }
            out.push_str("</ul>");
        }
    }

    out.push_str("<div class=\"prediction\">");
    if view.predictions.is_empty() {
        out.push_str(&placeholder("No predictions"));
    }
    for p in &view.predictions {
        let stats: Vec<String> = p
            .stats
            .iter()
            .map(|s| {
                let class = s.class.map(|c| c.css()).unwrap_or("");
                format!("<span class=\"{}\">{}</span>", class, escape_html(&s.text))
            })
            .collect();
        out.push_str(&format!("<div>{}</div>", format::render_items(&stats)));
        out.push_str(&format!(
            "<div><b>{}</b>: {}</div>",
            escape_html(&p.description),
            p.text_html
        ));
        if let Some(rows) = &p.request {
            out.push_str("<details><summary>Request</summary><table>");
            for (i, (k, v)) in rows.iter().enumerate() {
                let value = if i == 0 {
                    format!("<pre>{}</pre>", escape_html(v))
                } else {
                    escape_html(v)
                };
                out.push_str(&tr(&[td(&escape_html(k)), td(&value)]));
            }
            out.push_str("</table></details>");
        }
    }
    out.push_str("</div></div>");
    out
}

////////////////////////////////// Groups //////////////////////////////////////

fn render_group_header(ctx: &PageContext<'_>, name: &str, subgroup: Option<&str>) -> String {
    let metadata: GroupsMetadata = ctx
        .store
        .load_or_default(&ctx.store.groups_metadata_href());
    let (display_name, description, taxonomy) = match metadata.get(name) {
        Some(group) => (
            group.display_name.clone(),
            group.description.clone(),
            group.taxonomy.clone(),
        ),
        None => match ctx.schema.run_group(name) {
            Some(group) => (
                group.display_name().to_string(),
                group.description.clone(),
                None,
            ),
            None => return String::new(),
        },
    };

    let mut title = display_name;
    if let Some(sub) = subgroup {
        title.push_str(" / ");
        title.push_str(sub);
    }
    let mut out = format!("<div><h3>{}</h3>", escape_html(&title));
    out.push_str(&format!(
        "<div><i>{}</i></div>",
        render_markdown(&description)
    ));
    if let Some(taxonomy) = &taxonomy {
        out.push_str("<table class=\"taxonomy-table\">");
        for (k, v) in taxonomy {
            out.push_str(&tr(&[
                td(&format!("<b>{}</b>", escape_html(k))),
                td(&escape_html(&format::value_text(v))),
            ]));
        }
        out.push_str("</table>");
    }
    out.push_str("</div>");
    out
}

fn render_tables_from(ctx: &PageContext<'_>, href: &str) -> String {
    match ctx.store.load_optional::<Vec<Table>>(href) {
        Some(tables) => {
            debug!("{} tables in {}", tables.len(), href);
            render_tables(ctx, &tables, href)
        }
        None => placeholder("Tables are currently unavailable."),
    }
}

fn render_tables(ctx: &PageContext<'_>, tables: &[Table], json_href: &str) -> String {
    let mut toc: Vec<String> = tables
        .iter()
        .map(|t| link(&fragment(&t.title), &escape_html(&t.title)))
        .collect();
    toc.push(link(json_href, "JSON"));

    let mut out = format!("<div>{}</div>", format::render_items(&toc));
    for table in tables {
        out.push_str(&format!(
            "<div class=\"table-container\" id=\"{}\">{}</div>",
            escape_html(&table.title),
            render_table(ctx, table)
        ));
    }
    out
}

/// The column to sort `table` by, if the query asks for one it supports.
fn requested_sort(params: &UrlParams, table: &Table) -> Option<(usize, SortOrder)> {
    if params.get("sortTable")? != table.title {
        return None;
    }
    let column: usize = params.get("sortColumn")?.parse().ok()?;
    let order = tables::sort_order(table.header.get(column)?)?;
    Some((column, order))
}

fn render_table(ctx: &PageContext<'_>, table: &Table) -> String {
    let mut out = format!(
        "<h3>{}</h3>",
        anchor(&table.title, &escape_html(&table.title))
    );
    out.push_str("<table class=\"query-table results-table\"><thead><tr>");
    for (i, cell) in table.header.iter().enumerate() {
        let mut html = render_cell_value(cell);
        if tables::sort_order(cell).is_some() {
            let column = i.to_string();
            let href = format!(
                "{}{}",
                ctx.params
                    .with([
                        ("sortTable", Some(table.title.as_str())),
                        ("sortColumn", Some(column.as_str())),
                    ])
                    .encode(),
                fragment(&table.title)
            );
            html.push_str(&format!(" [&nbsp;{}&nbsp;]", link(&href, "sort")));
        }
        out.push_str(&td(&html));
    }
    out.push_str("</tr></thead><tbody>");

    let rows = match requested_sort(ctx.params, table) {
        Some((column, order)) => tables::sort_rows(table, column, order),
        None => table.rows.clone(),
    };
    for row in &rows {
        let cells: Vec<String> = row.iter().map(|c| td(&render_cell_value(c))).collect();
        out.push_str(&tr(&cells));
    }
    out.push_str("</tbody></table>");

    let mut links: Vec<String> = table
        .links
        .iter()
        .map(|l| link(&l.href, &escape_html(&l.text)))
        .collect();
    let mut latex_params = UrlParams::default();
    if let Some(suite) = ctx.params.get("suite") {
        latex_params.set("suite", suite);
    }
    latex_params.set("latex", tables::latex_name(&table.title));
    links.push(link(&latex_params.encode(), "[latex]"));
    out.push_str(&format!("<div>{}</div>", format::render_items(&links)));
    out
}

fn render_cell_value(cell: &Cell) -> String {
    let text = tables::cell_text(cell);
    let inner = if cell.markdown && !text.is_empty() {
        render_markdown(&text)
    } else {
        escape_html(&text)
    };

    let mut attrs = String::new();
    if let Some(style) = &cell.style {
        let css: Vec<String> = style
            .iter()
            .map(|(k, v)| format!("{}: {}", k, format::value_text(v)))
            .collect();
        attrs.push_str(&format!(" style=\"{}\"", escape_html(&css.join("; "))));
    }
    if let Some(d) = &cell.description {
        attrs.push_str(&format!(" title=\"{}\"", escape_html(d)));
    }
    let span = format!("<span{}>{}</span>", attrs, inner);
    match &cell.href {
        Some(href) => link(href, &span),
        None => span,
    }
}

////////////////////////////////// LaTeX ///////////////////////////////////////

/// Raw LaTeX of one table, without the HTML shell.
pub fn latex_source(config: &SiteConfig, suite: &str, name: &str) -> Result<String> {
    let name = check_path_component("latex", name)?;
    let store = Store::new(config, suite);
    store.load_text(&store.latex_href(&name))
}

fn render_latex(ctx: &PageContext<'_>, name: &str) -> String {
    match ctx.store.load_text(&ctx.store.latex_href(name)) {
        Ok(text) => format!("<div class=\"latex\"><pre>{}</pre></div>", escape_html(&text)),
        Err(e) => {
            error!("{:#}", e);
            placeholder("LaTeX is currently unavailable.")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;
    use std::path::Path;

    const SCHEMA: &str = r#"
models:
  - name: openai/davinci
    display_name: davinci
    creator_organization: OpenAI
    description: A *large* model
    access: limited
adapter:
  - name: method
    description: Adaptation method
  - name: model
    description: Model
metrics:
  - name: exact_match
    display_name: Exact match
metric_groups:
  - name: accuracy
    display_name: Accuracy
    metrics:
      - name: ${main_name}
run_groups:
  - name: core_scenarios
    display_name: Core scenarios
    category: Core scenarios
    subgroups: [qa]
  - name: qa
    display_name: Question answering
    description: Answer questions
    metric_groups: [accuracy]
    environment:
      main_name: exact_match
    taxonomy:
      task: question answering
      what: trivia
      who: web users
      when: "2020"
      language: English
"#;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn site() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        let suite = "benchmark_output/runs/v1.0";
        write(root, "schema.yaml", SCHEMA);
        write(root, &format!("{}/summary.json", suite), r#"{"suite": "v1.0", "date": "2022-11-17"}"#);
        write(
            root,
            &format!("{}/run_specs.json", suite),
            r#"[
              {"name": "qa:model=a", "groups": ["qa"], "adapter_spec": {"method": "generation", "model": "a"}},
              {"name": "qa:model=b", "groups": ["qa"], "adapter_spec": {"method": "generation", "model": "b"}},
              {"name": "other:model=a", "adapter_spec": {"method": "multiple_choice_joint", "model": "a"}}
            ]"#,
        );
        for (run, answer, em) in [("qa:model=a", "Paris", 1.0), ("qa:model=b", "Rome", 0.0)] {
            write(
                root,
                &format!("{}/{}/instances.json", suite, run),
                r#"[{"id": "id1", "input": "Capital of France?", "split": "test",
                     "references": [{"output": "Paris", "tags": ["correct"]}]},
                    {"id": "id2", "input": "Capital of Italy?", "split": "test",
                     "references": [{"output": "Rome", "tags": ["correct"]}]}]"#,
            );
            write(
                root,
                &format!("{}/{}/display_predictions.json", suite, run),
                &format!(
                    r#"[{{"instance_id": "id1", "train_trial_index": 0, "predicted_text": "{}",
                          "stats": {{"exact_match": {}}}}}]"#,
                    answer, em
                ),
            );
            write(
                root,
                &format!("{}/{}/display_requests.json", suite, run),
                r#"[{"instance_id": "id1", "train_trial_index": 0, "request": {"prompt": "Q: Capital of France?", "temperature": 0}}]"#,
            );
            write(
                root,
                &format!("{}/{}/stats.json", suite, run),
                &format!(r#"[{{"name": {{"name": "exact_match", "split": "test"}}, "mean": {}}}]"#, em),
            );
            write(
                root,
                &format!("{}/{}/scenario.json", suite, run),
                r#"{"name": "qa", "description": "Trivia", "definition_path": "https://example.org/qa.py"}"#,
            );
        }
        write(
            root,
            &format!("{}/groups/qa.json", suite),
            r#"[{"title": "Accuracy",
                 "header": [{"value": "Model"}, {"value": "EM ↑", "description": "Exact match"}],
                 "rows": [[{"value": "a"}, {"value": 0.25}],
                          [{"value": "b", "href": "?runSpec=qa:model=b"}, {"value": 0.75}],
                          [{"value": "c"}, {"value": null}]],
                 "links": [{"text": "compare", "href": "?runSpecRegex=qa.*"}]}]"#,
        );
        write(
            root,
            &format!("{}/groups_metadata.json", suite),
            r#"{"qa": {"display_name": "Question answering", "description": "Answer *questions*",
                       "taxonomy": {"task": "question answering"}}}"#,
        );
        write(root, &format!("{}/groups/latex/Accuracy.tex", suite), "\\begin{tabular}\\end{tabular}");
        dir
    }

    fn render(root: &Path, qs: &str) -> String {
        let config = SiteConfig {
            root: root.to_path_buf(),
            default_suite: "v1.0".to_string(),
        };
        render_page(&config, &UrlParams::decode(qs)).unwrap()
    }

    fn count(haystack: &str, needle: &str) -> usize {
        haystack.matches(needle).count()
    }

    #[test]
    fn landing_lists_counts() {
        let dir = site();
        let html = render(dir.path(), "");
        assert!(html.contains("1 models"));
        assert!(html.contains("1 scenarios"));
        assert!(html.contains("1 metrics"));
        assert!(html.contains("v1.0 (last updated 2022-11-17)"));
    }

    #[test]
    fn models_and_scenarios_tables() {
        let dir = site();
        let html = render(dir.path(), "?models");
        assert!(html.contains("A <em>large</em> model"));
        assert!(html.contains("openai/davinci"));

        let html = render(dir.path(), "?scenarios");
        // Only the scenario-level group is listed.
        assert_eq!(count(&html, "technical-details\">qa<"), 1);
        assert!(!html.contains("technical-details\">core_scenarios<"));
        assert!(html.contains("<td>trivia</td><td>2020</td><td>web users</td>"));
    }

    #[test]
    fn runs_overview_filters_by_query() {
        let dir = site();
        let all = render(dir.path(), "?runs");
        assert_eq!(count(&all, "?runs=1&amp;runSpec="), 3);

        let filtered = render(dir.path(), "?runs&query=model%3Da");
        assert_eq!(count(&filtered, "?runs=1&amp;runSpec="), 2);
        assert!(filtered.contains("Open all matching runs"));
    }

    #[test]
    fn run_detail_compares_runs() {
        let dir = site();
        let html = render(dir.path(), "?runSpecRegex=qa.*");
        // Runs are labelled by the adapter setting that differs.
        assert!(html.contains("<td>model=a</td><td>model=b</td>"));
        assert!(html.contains("<b>[model=a] Prediction</b>: Paris"));
        assert!(html.contains("<b>[model=b] Prediction</b>: Rome"));
        assert!(html.contains("<span class=\"correct\">Exact match: 1</span>"));
        assert!(html.contains("<span class=\"wrong\">Exact match: 0</span>"));
        assert_eq!(count(&html, "<summary>Request</summary>"), 2);
        assert!(html.contains("<pre>Q: Capital of France?</pre>"));
        // id2 has no predictions.
        assert_eq!(count(&html, "No predictions"), 1);
        assert!(html.contains("<b>exact_match</b> on test"));
        assert!(html.contains("<td>1</td><td>0</td>"));
    }

    #[test]
    fn run_detail_without_match_is_error() {
        let dir = site();
        let html = render(dir.path(), "?runSpec=nope");
        assert!(html.contains("No matching runs"));
    }

    #[test]
    fn run_detail_with_missing_artifacts_uses_placeholders() {
        let dir = site();
        let html = render(dir.path(), "?runSpec=other:model%3Da");
        assert!(html.contains("Instances are currently unavailable."));
        assert!(html.contains("Metrics are currently unavailable. Please try again later."));
        assert!(html.contains("Scenario info unavailable."));
    }

    #[test]
    fn metrics_query_filters_rows() {
        let dir = site();
        let html = render(dir.path(), "?runSpec=qa:model%3Da&metricsQuery=nothing");
        assert!(!html.contains("<b>exact_match</b> on test"));
    }

    #[test]
    fn group_page_renders_table_rows_and_sorts() {
        let dir = site();
        let html = render(dir.path(), "?group=qa&subgroup=trivia");
        assert!(html.contains("<h3>Question answering / trivia</h3>"));
        assert!(html.contains("<td><b>task</b></td><td>question answering</td>"));
        // Taxonomy row, header row, three body rows.
        assert_eq!(count(&html, "<tr>"), 5);
        assert!(html.contains("?latex=Accuracy"));

        let sorted = render(dir.path(), "?group=qa&sortTable=Accuracy&sortColumn=1");
        let b = sorted.find(">b<").unwrap();
        let a = sorted.find(">a<").unwrap();
        let c = sorted.find(">c<").unwrap();
        assert!(b < a && a < c);
    }

    #[test]
    fn group_header_falls_back_to_schema() {
        let dir = site();
        fs::remove_file(dir.path().join("benchmark_output/runs/v1.0/groups_metadata.json")).unwrap();
        let html = render(dir.path(), "?group=qa");
        assert!(html.contains("<h3>Question answering</h3>"));
        assert!(html.contains("<i>Answer questions</i>"));
    }

    #[test]
    fn table_links_encode_fragments() {
        let dir = site();
        write(
            dir.path(),
            "benchmark_output/runs/v1.0/groups.json",
            r#"[{"title": "Accuracy / core", "header": [{"value": "EM ↑"}], "rows": []}]"#,
        );
        let html = render(dir.path(), "?groups");
        assert!(html.contains("<a href=\"#Accuracy%20%2F%20core\">Accuracy / core</a>"));
        assert!(html.contains("sortColumn=0#Accuracy%20%2F%20core"));
        assert!(!html.contains("#Accuracy / core"));
    }

    #[test]
    fn latex_page_shows_source() {
        let dir = site();
        let html = render(dir.path(), "?latex=Accuracy");
        assert!(html.contains("<pre>\\begin{tabular}\\end{tabular}</pre>"));
        let missing = render(dir.path(), "?latex=Nope");
        assert!(missing.contains("LaTeX is currently unavailable."));
    }

    #[test]
    fn latex_source_rejects_paths() {
        let dir = site();
        let config = SiteConfig {
            root: dir.path().to_path_buf(),
            default_suite: "v1.0".to_string(),
        };
        assert_eq!(
            latex_source(&config, "v1.0", "Accuracy").unwrap(),
            "\\begin{tabular}\\end{tabular}"
        );
        assert!(latex_source(&config, "v1.0", "../schema").is_err());
    }

    #[test]
    fn bad_query_renders_error_page() {
        let dir = site();
        let html = render(dir.path(), "?runSpecs=notjson");
        assert!(html.contains("class=\"error\""));
    }

    #[test]
    fn suite_cannot_leave_site_root() {
        let dir = site();
        // Move the site one level down and put a groups table beside it.
        let root = dir.path().join("site");
        fs::create_dir_all(&root).unwrap();
        let entries: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().path())
            .collect();
        for path in entries {
            if path != root {
                fs::rename(&path, root.join(path.file_name().unwrap())).unwrap();
            }
        }
        write(
            dir.path(),
            "secret/groups.json",
            r#"[{"title": "SECRET-TABLE", "header": [], "rows": []}]"#,
        );

        let html = render(&root, "?groups&suite=../../../secret");
        assert!(!html.contains("SECRET-TABLE"));
        assert!(html.contains("class=\"error\""));
        assert!(html.contains("suite must be a plain name"));

        let html = render(&root, "?groups&suite=..");
        assert!(html.contains("class=\"error\""));
    }

    #[test]
    fn missing_schema_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let config = SiteConfig {
            root: dir.path().to_path_buf(),
            default_suite: "v1.0".to_string(),
        };
        assert!(render_page(&config, &UrlParams::default()).is_err());
    }

    #[test]
    fn nav_keeps_suite() {
        assert_eq!(
            nav(&UrlParams::decode("?suite=v2&group=x")),
            [
                "<a href=\"?suite=v2\">Home</a>",
                "<a href=\"?suite=v2&amp;models=1\">Models</a>",
                "<a href=\"?suite=v2&amp;scenarios=1\">Scenarios</a>",
                "<a href=\"?suite=v2&amp;runs=1\">Runs</a>",
                "<a href=\"?suite=v2&amp;groups=1\">Groups</a>",
            ]
            .concat()
        );
    }
}
