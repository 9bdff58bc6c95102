//! Leptos painter for the homepage windows.
//!
//! All window state lives in [`HomepageApp`]. The components here only mirror its views in
//! signals, forward DOM events as [`UiEvent`]s and apply the returned [`BridgeEffect`]s.

use std::{collections::HashMap, rc::Rc};

use futures::FutureExt;
use homepage_runtime::{
    bridge::{BookmarkItem, EngineOption},
    palette::ColorOption,
    AddWindowOptions, AppConfig, BridgeEffect, Control, HomepageApp, MountedWindow, Notice,
    NoticeLevel, Position, Size, Theme, UiEvent, UiEventKind, Viewport, WindowBody, WindowId,
    WindowPatch, WindowView,
};
use leptos::*;
use leptos_meta::{provide_meta_context, Title};
use log::{debug, info, warn};
use platform_host_web::{build_host_services, listen_messages, sleep_ms, MessageHandler};
use serde_json::Value;

use crate::messaging::answer_host_message;

/// Interval of the timer pump driving debounced saves and throttled searches.
const TICK_INTERVAL_MS: u32 = 100;
const VISIBLE_NOTICES: usize = 5;

type SearchResults = HashMap<WindowId, (Vec<BookmarkItem>, usize)>;

#[derive(Clone, Copy)]
struct HomepageContext {
    app: StoredValue<Rc<HomepageApp>>,
    views: RwSignal<Vec<WindowView>>,
    results: RwSignal<SearchResults>,
    queries: RwSignal<HashMap<WindowId, String>>,
    picker: RwSignal<Option<(WindowId, &'static [ColorOption])>>,
    add_options: RwSignal<Option<AddWindowOptions>>,
    notices: RwSignal<Vec<Notice>>,
    theme: RwSignal<Theme>,
    background: RwSignal<String>,
    settings_open: RwSignal<bool>,
}

fn use_homepage() -> HomepageContext {
    expect_context::<HomepageContext>()
}

impl HomepageContext {
    fn new(app: Rc<HomepageApp>) -> Self {
        Self {
            app: store_value(app),
            views: create_rw_signal(Vec::new()),
            results: create_rw_signal(HashMap::new()),
            queries: create_rw_signal(HashMap::new()),
            picker: create_rw_signal(None),
            add_options: create_rw_signal(None),
            notices: create_rw_signal(Vec::new()),
            theme: create_rw_signal(Theme::default()),
            background: create_rw_signal(String::new()),
            settings_open: create_rw_signal(false),
        }
    }

    fn with_app<R>(&self, f: impl FnOnce(&HomepageApp) -> R) -> R {
        self.app.with_value(|app| f(app))
    }

    /// Runs a synchronous app operation and re-reads everything it may have touched.
    fn run(&self, f: impl FnOnce(&HomepageApp)) {
        self.with_app(f);
        self.refresh();
    }

    fn refresh(&self) {
        let app = self.app.get_value();
        self.views.set(app.bridge().views());
        self.theme.set(app.store().theme());
        self.background.set(app.store().background_image());
        self.settings_open.set(app.is_settings_open());
        self.pull_notices();
    }

    fn pull_notices(&self) {
        let fresh = self.with_app(HomepageApp::notices);
        if !fresh.is_empty() {
            self.notices.update(|notices| notices.extend(fresh));
        }
    }

    fn post_error(&self, message: String) {
        self.notices
            .update(|notices| notices.push(Notice::new(NoticeLevel::Error, message)));
    }

    fn apply(&self, effects: Vec<BridgeEffect>) {
        let mut rerender = false;
        for effect in effects {
            match effect {
                BridgeEffect::Render(_)
                | BridgeEffect::RenderAll
                | BridgeEffect::Raise { .. }
                | BridgeEffect::Move { .. } => rerender = true,
                BridgeEffect::Unmount(id) => {
                    self.results.update(|results| {
                        results.remove(&id);
                    });
                    self.queries.update(|queries| {
                        queries.remove(&id);
                    });
                    rerender = true;
                }
                BridgeEffect::ShowColorPicker { id, options } => self.picker.set(Some((id, options))),
                BridgeEffect::ShowBookmarks {
                    id,
                    items,
                    remaining,
                } => self.results.update(|results| {
                    results.insert(id, (items, remaining));
                }),
                BridgeEffect::Navigate(href) => navigate(&href),
                BridgeEffect::ClearInput(id) => self.queries.update(|queries| {
                    queries.remove(&id);
                }),
            }
        }
        if rerender {
            self.refresh();
        } else {
            self.pull_notices();
        }
    }

    fn dispatch(&self, event: UiEvent) {
        let ctx = *self;
        spawn_local(async move {
            let app = ctx.app.get_value();
            match app.dispatch(event).await {
                Ok(effects) => ctx.apply(effects),
                Err(err) => {
                    warn!("ui event rejected: {err}");
                    ctx.refresh();
                }
            }
        });
    }

    fn start(self) {
        spawn_local(async move {
            let app = self.app.get_value();
            match app.init().await {
                Ok(report) => info!(
                    "homepage ready with {} windows (restored from {:?})",
                    report.views.len(),
                    report.restored_from
                ),
                Err(err) => warn!("homepage init failed: {err}"),
            }
            self.refresh();
        });

        spawn_local(async move {
            loop {
                sleep_ms(TICK_INTERVAL_MS).await;
                let app = self.app.get_value();
                let report = app.tick().await;
                if let Some(flushed) = report.flushed {
                    debug!("state flushed: {flushed:?}");
                }
                self.apply(report.effects);
            }
        });
    }

    fn add_window(&self, folder: &str) {
        match self.with_app(|app| app.add_window(folder)) {
            Ok(id) => {
                debug!("added window {id} for `{folder}`");
                self.add_options.set(None);
            }
            Err(err) => self.post_error(err.to_string()),
        }
        self.refresh();
    }

    fn auto_align(&self) {
        let ctx = *self;
        spawn_local(async move {
            let app = ctx.app.get_value();
            app.auto_align().await;
            ctx.refresh();
        });
    }

    fn save_layout(&self) {
        let ctx = *self;
        spawn_local(async move {
            let app = ctx.app.get_value();
            let (measured, mounted) = measure_windows(&ctx.views.get_untracked());
            let drift = app.bridge().detect_drift(&mounted);
            if !drift.is_empty() {
                debug!("painter drift before save: {drift:?}");
            }
            let report = app.save_current_layout(&measured).await;
            debug!("layout saved: {report:?}");
            ctx.refresh();
        });
    }

    fn set_background(&self, value: String) {
        if let Err(err) = self.with_app(|app| app.set_background(&value)) {
            self.post_error(err.to_string());
        }
        self.refresh();
    }

    fn reset(&self) {
        let ctx = *self;
        spawn_local(async move {
            let app = ctx.app.get_value();
            if let Err(err) = app.reset_settings().await {
                ctx.post_error(err.to_string());
            }
            ctx.results.set(HashMap::new());
            ctx.queries.set(HashMap::new());
            ctx.picker.set(None);
            ctx.add_options.set(None);
            ctx.refresh();
        });
    }
}

fn current_viewport() -> Viewport {
    let Some(window) = web_sys::window() else {
        return Viewport::default();
    };
    let width = window.inner_width().ok().and_then(|v| v.as_f64());
    let height = window.inner_height().ok().and_then(|v| v.as_f64());
    match (width, height) {
        (Some(width), Some(height)) => Viewport::new(width as i32, height as i32),
        _ => Viewport::default(),
    }
}

fn navigate(href: &str) {
    if let Some(window) = web_sys::window() {
        if let Err(err) = window.location().set_href(href) {
            warn!("navigation failed: {err:?}");
        }
    }
}

/// Reads back the rendered geometry and titles of every window.
fn measure_windows(views: &[WindowView]) -> (Vec<(WindowId, WindowPatch)>, Vec<MountedWindow>) {
    let Some(document) = web_sys::window().and_then(|window| window.document()) else {
        return (Vec::new(), Vec::new());
    };
    let mut measured = Vec::new();
    let mut mounted = Vec::new();
    for view in views {
        let Some(element) = document.get_element_by_id(&view.dom_id) else {
            continue;
        };
        let rect = element.get_bounding_client_rect();
        let minimized = view.classes.iter().any(|class| class == "minimized");
        measured.push((
            view.id,
            WindowPatch {
                position: Some(Position::new(rect.left() as i32, rect.top() as i32)),
                size: (!minimized)
                    .then(|| Size::new(rect.width() as i32, rect.height() as i32)),
                ..WindowPatch::default()
            },
        ));
        let title = element
            .query_selector(".window-title")
            .ok()
            .flatten()
            .and_then(|node| node.text_content())
            .unwrap_or_default();
        mounted.push(MountedWindow {
            dom_id: view.dom_id.clone(),
            title,
        });
    }
    (measured, mounted)
}

/// Inline style for the page background. Bare `data:image/` URIs are wrapped in `url()`.
fn background_css(value: &str) -> String {
    let value = value.trim();
    if value.is_empty() {
        return String::new();
    }
    if value.to_ascii_lowercase().starts_with("data:image/") {
        format!("background:url(\"{value}\") center / cover no-repeat;")
    } else {
        format!("background:{value};background-size:cover;")
    }
}

fn listen_host_messages(ctx: HomepageContext) {
    let handler: MessageHandler = Rc::new(move |message: Value| {
        async move {
            let app = ctx.app.get_value();
            let reply = answer_host_message(&app, &message, sleep_ms).await;
            ctx.refresh();
            serde_json::to_value(reply).unwrap_or(Value::Null)
        }
        .boxed_local()
    });
    if !listen_messages(handler) {
        debug!("no extension messaging channel on this page");
    }
}

#[component]
pub fn HomepageRoot() -> impl IntoView {
    provide_meta_context();

    let config = AppConfig {
        viewport: current_viewport(),
        ..AppConfig::default()
    };
    let app = Rc::new(HomepageApp::new(build_host_services(), config));
    let ctx = HomepageContext::new(app);
    provide_context(ctx);
    listen_host_messages(ctx);
    ctx.start();

    let _ = window_event_listener(ev::pointermove, move |ev| {
        if ctx.with_app(|app| app.bridge().is_dragging()) {
            ctx.dispatch(UiEvent::new(
                UiEventKind::PointerMove {
                    x: ev.client_x(),
                    y: ev.client_y(),
                },
                Vec::new(),
            ));
        }
    });
    let _ = window_event_listener(ev::pointerup, move |_| {
        if ctx.with_app(|app| app.bridge().is_dragging()) {
            ctx.dispatch(UiEvent::new(UiEventKind::PointerUp, Vec::new()));
        }
    });
    let _ = window_event_listener(ev::resize, move |_| {
        ctx.with_app(|app| app.set_viewport(current_viewport()));
    });

    view! {
        <Title text="Bookmarks" />
        <main
            class=move || format!("homepage theme-{}", ctx.theme.get().as_str())
            style=move || background_css(&ctx.background.get())
        >
            <Toolbar />
            <For
                each={move || ctx.views.get().into_iter().map(|view| view.id).collect::<Vec<_>>()}
                key=|id| *id
                children={move |id| view! { <HomepageWindow id=id /> }}
            />
            <ColorPicker />
            <Show when=move || ctx.settings_open.get() fallback=|| ()>
                <SettingsPanel />
            </Show>
            <NoticeList />
        </main>
    }
}

#[component]
fn Toolbar() -> impl IntoView {
    let ctx = use_homepage();
    let open_add_dialog = move |_| {
        let options = ctx.with_app(HomepageApp::add_window_options);
        ctx.add_options.set(Some(options));
    };

    view! {
        <nav class="toolbar" aria-label="Homepage actions">
            <button on:click=open_add_dialog>"Add window"</button>
            <button on:click=move |_| ctx.auto_align()>"Align"</button>
            <button on:click=move |_| ctx.save_layout()>"Save layout"</button>
            <button on:click=move |_| ctx.run(|app| {
                app.toggle_theme();
            })>
                {move || match ctx.theme.get() {
                    Theme::Light => "Dark mode",
                    Theme::Dark => "Light mode",
                }}
            </button>
            <button on:click=move |_| ctx.run(|app| {
                app.toggle_settings();
            })>"Settings"</button>
        </nav>
        <AddWindowDialog />
    }
}

#[component]
fn AddWindowDialog() -> impl IntoView {
    let ctx = use_homepage();
    move || {
        ctx.add_options.get().map(|options| {
            let body = match options {
                AddWindowOptions::NoFolders => {
                    view! { <p>"No bookmark folders were found."</p> }.into_view()
                }
                AddWindowOptions::AllFoldersHaveWindows => {
                    view! { <p>"Every folder already has a window."</p> }.into_view()
                }
                AddWindowOptions::Available(folders) => folders
                    .into_iter()
                    .map(|folder| {
                        let label = folder.clone();
                        view! {
                            <button class="folder-option" on:click=move |_| ctx.add_window(&folder)>
                                {label}
                            </button>
                        }
                    })
                    .collect_view(),
            };
            view! {
                <div class="add-window-dialog" role="dialog" aria-label="Add a window">
                    {body}
                    <button on:click=move |_| ctx.add_options.set(None)>"Cancel"</button>
                </div>
            }
        })
    }
}

#[component]
fn HomepageWindow(id: WindowId) -> impl IntoView {
    let ctx = use_homepage();
    let window = Signal::derive(move || ctx.views.get().into_iter().find(|view| view.id == id));

    let begin_drag = move |ev: web_sys::PointerEvent| {
        if ev.button() != 0 {
            return;
        }
        ev.prevent_default();
        ctx.dispatch(UiEvent::on_window(
            UiEventKind::PointerDown {
                x: ev.client_x(),
                y: ev.client_y(),
            },
            id,
        ));
    };

    move || {
        let Some(win) = window.get() else {
            return ().into_view();
        };
        let style = format!(
            "left:{}px;top:{}px;width:{}px;height:{}px;z-index:{};",
            win.position.x, win.position.y, win.size.width, win.size.height, win.z_index
        );
        view! {
            <section
                id=win.dom_id.clone()
                data-window-id=id.to_string()
                class=win.classes.join(" ")
                style=style
                aria-label=win.title.clone()
            >
                <header class=format!("window-header {}", win.header_class) on:pointerdown=begin_drag>
                    <span class="window-icon" aria-hidden="true">{win.icon.clone()}</span>
                    <span class="window-title">{win.title.clone()}</span>
                    <div class="window-controls">
                        {win
                            .controls
                            .iter()
                            .map(|control| view! { <WindowControl id=id control=*control /> })
                            .collect_view()}
                    </div>
                </header>
                <div class="window-body">{window_body(ctx, id, win.body)}</div>
            </section>
        }
        .into_view()
    }
}

#[component]
fn WindowControl(id: WindowId, control: Control) -> impl IntoView {
    let ctx = use_homepage();
    let (label, glyph, kind) = match control {
        Control::ColorPicker => ("Change header color", "🎨", UiEventKind::ColorPickClick),
        Control::Minimize => ("Minimize window", "−", UiEventKind::MinimizeClick),
        Control::Close => ("Close window", "×", UiEventKind::CloseClick),
    };

    view! {
        <button
            class="window-control"
            aria-label=label
            on:pointerdown=|ev: web_sys::PointerEvent| ev.stop_propagation()
            on:click=move |_| ctx.dispatch(UiEvent::on_window(kind.clone(), id))
        >
            {glyph}
        </button>
    }
}

fn window_body(ctx: HomepageContext, id: WindowId, body: WindowBody) -> View {
    match body {
        WindowBody::Bookmarks { items, remaining } => bookmark_body(ctx, id, items, remaining),
        WindowBody::Search { engines } => query_body(ctx, id, engines, "Search the web"),
        WindowBody::Translation { engines } => query_body(ctx, id, engines, "Text to translate"),
    }
}

fn bookmark_body(
    ctx: HomepageContext,
    id: WindowId,
    items: Vec<BookmarkItem>,
    remaining: usize,
) -> View {
    let shown = move || {
        ctx.results
            .with(|results| results.get(&id).cloned())
            .unwrap_or_else(|| (items.clone(), remaining))
    };

    view! {
        <input
            type="search"
            class="bookmark-search"
            placeholder="Filter bookmarks"
            on:input=move |ev| {
                ctx.dispatch(UiEvent::on_window(UiEventKind::BookmarkSearch(event_target_value(&ev)), id))
            }
        />
        {move || {
            let (items, remaining) = shown();
            view! {
                <ul class="bookmark-list">
                    {items.into_iter().map(|item| bookmark_row(ctx, id, item)).collect_view()}
                </ul>
                {(remaining > 0)
                    .then(|| {
                        view! {
                            <button
                                class="load-more"
                                on:click=move |_| ctx.dispatch(UiEvent::on_window(UiEventKind::LoadMore, id))
                            >
                                {format!("Show {remaining} more")}
                            </button>
                        }
                    })}
            }
        }}
    }
    .into_view()
}

fn bookmark_row(ctx: HomepageContext, id: WindowId, item: BookmarkItem) -> View {
    match item.href {
        Some(href) => {
            let target = href.clone();
            view! {
                <li class="bookmark">
                    <a
                        href=href
                        on:click=move |ev: web_sys::MouseEvent| {
                            ev.prevent_default();
                            ctx.dispatch(UiEvent::on_window(UiEventKind::BookmarkClick(target.clone()), id));
                        }
                    >
                        {item.title}
                    </a>
                </li>
            }
            .into_view()
        }
        None => view! { <li class="bookmark inert">{item.title}</li> }.into_view(),
    }
}

fn query_body(
    ctx: HomepageContext,
    id: WindowId,
    engines: Vec<EngineOption>,
    placeholder: &'static str,
) -> View {
    let current = move || ctx.queries.with(|queries| queries.get(&id).cloned().unwrap_or_default());
    let submit = move |ev: ev::SubmitEvent| {
        ev.prevent_default();
        let text = ctx
            .queries
            .with_untracked(|queries| queries.get(&id).cloned().unwrap_or_default());
        ctx.dispatch(UiEvent::on_window(UiEventKind::QuerySubmit(text), id));
    };

    view! {
        <form class="query-form" on:submit=submit>
            <input
                type="text"
                placeholder=placeholder
                prop:value=current
                on:input=move |ev| {
                    let text = event_target_value(&ev);
                    ctx.queries.update(|queries| {
                        queries.insert(id, text);
                    });
                }
            />
            <select on:change=move |ev| {
                ctx.dispatch(UiEvent::on_window(UiEventKind::EngineSelect(event_target_value(&ev)), id))
            }>
                {engines
                    .into_iter()
                    .map(|engine| view! {
                        <option value=engine.name selected=engine.selected>{engine.name}</option>
                    })
                    .collect_view()}
            </select>
            <button type="submit">"Go"</button>
        </form>
    }
    .into_view()
}

#[component]
fn ColorPicker() -> impl IntoView {
    let ctx = use_homepage();
    move || {
        ctx.picker.get().map(|(id, options)| {
            view! {
                <div class="color-picker" role="dialog" aria-label="Header color">
                    {options
                        .iter()
                        .map(|option| {
                            let class = option.class;
                            view! {
                                <button
                                    class=format!("color-swatch {class}")
                                    title=option.name
                                    style=format!("background:{};", option.swatch)
                                    on:click=move |_| {
                                        ctx.picker.set(None);
                                        ctx.dispatch(UiEvent::on_window(UiEventKind::ColorChosen(class.to_string()), id));
                                    }
                                />
                            }
                        })
                        .collect_view()}
                    <button class="color-picker-cancel" on:click=move |_| ctx.picker.set(None)>
                        "Cancel"
                    </button>
                </div>
            }
        })
    }
}

#[component]
fn SettingsPanel() -> impl IntoView {
    let ctx = use_homepage();
    let draft = create_rw_signal(ctx.background.get_untracked());

    view! {
        <aside class="settings-panel" aria-label="Settings">
            <h2>"Settings"</h2>
            <label>
                "Background"
                <input
                    type="text"
                    prop:value=move || draft.get()
                    on:input=move |ev| draft.set(event_target_value(&ev))
                />
            </label>
            <button on:click=move |_| ctx.set_background(draft.get_untracked())>"Apply"</button>
            <button class="danger" on:click=move |_| ctx.reset()>"Reset everything"</button>
            <button on:click=move |_| ctx.run(|app| {
                app.toggle_settings();
            })>"Close"</button>
        </aside>
    }
}

#[component]
fn NoticeList() -> impl IntoView {
    let ctx = use_homepage();
    let dismiss = move |index: usize| {
        ctx.notices.update(|notices| {
            if index < notices.len() {
                notices.remove(index);
            }
        });
    };

    view! {
        <ul class="notices" aria-live="polite">
            {move || {
                let notices = ctx.notices.get();
                let skip = notices.len().saturating_sub(VISIBLE_NOTICES);
                notices
                    .into_iter()
                    .enumerate()
                    .skip(skip)
                    .map(|(index, notice)| view! {
                        <li class=format!("notice notice-{}", notice.level.as_str())>
                            <span>{notice.message}</span>
                            <button aria-label="Dismiss" on:click=move |_| dismiss(index)>"×"</button>
                        </li>
                    })
                    .collect_view()
            }}
        </ul>
    }
}
