use anyhow::{Context, Result};
use axquery::ax::{
    move_and_click, Accessibility, Element, GraphBuilder, InputDriver, Literal, MemoryTree, Outcome, Qualifier, Snapshot,
};
use axquery::config::AppConfig;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::rc::Rc;
use tracing::info;

#[derive(Parser)]
#[command(name = "axquery", about = "辅助功能元素查询工具")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// 配置文件路径
    #[arg(short, long)]
    config: Option<String>,
}

/// 元素来源：离线快照或运行中的进程
#[derive(Args)]
struct Source {
    /// JSON 快照文件
    #[arg(long, conflicts_with = "pid")]
    snapshot: Option<PathBuf>,

    /// 目标进程 ID（仅 macOS）
    #[arg(long)]
    pid: Option<i32>,
}

#[derive(Subcommand)]
enum Commands {
    /// 检查辅助功能权限
    Check,
    /// 打印元素树
    Tree {
        #[command(flatten)]
        source: Source,
        /// 最大深度（默认取配置）
        #[arg(long)]
        max_depth: Option<usize>,
        /// 以 JSON 快照格式输出
        #[arg(long)]
        json: bool,
    },
    /// 输出 Graphviz DOT 格式的 UI 树
    Graph {
        #[command(flatten)]
        source: Source,
        #[arg(long)]
        max_depth: Option<usize>,
    },
    /// 对根元素发起符号化请求（属性、操作或后代搜索）
    Query {
        #[command(flatten)]
        source: Source,
        /// 请求名，如 title、press、buttons、enabled?
        name: String,
        /// 搜索过滤条件（JSON 对象），如 '{"title":"OK"}'
        #[arg(long)]
        filter: Option<String>,
        /// 写入属性值（JSON 字面值，无法解析时按字符串处理）
        #[arg(long)]
        set: Option<String>,
    },
    /// 搜索后代元素并用鼠标点击其中心
    Click {
        #[command(flatten)]
        source: Source,
        /// 请求名，须解析为搜索，如 button、buttons
        name: String,
        /// 搜索过滤条件（JSON 对象）
        #[arg(long)]
        filter: Option<String>,
    },
    /// 查找屏幕坐标处的元素
    At {
        #[command(flatten)]
        source: Source,
        x: f64,
        y: f64,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // 加载配置
    let config = match &cli.config {
        Some(path) => AppConfig::load(std::path::Path::new(path))?,
        None => AppConfig::load_or_default(),
    };

    // 初始化日志，输出到 stderr 以免混入 DOT / JSON 输出
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| config.general.log_level.parse().unwrap_or_default());
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let source = match &cli.command {
        Commands::Check => return cmd_check(),
        Commands::Tree { source, .. }
        | Commands::Graph { source, .. }
        | Commands::Query { source, .. }
        | Commands::Click { source, .. }
        | Commands::At { source, .. } => source,
    };

    if let Some(path) = &source.snapshot {
        let tree = Rc::new(
            MemoryTree::load(path).with_context(|| format!("Failed to load snapshot {}", path.display()))?,
        );
        return run(tree.root()?, &cli.command, &config);
    }

    match source.pid {
        Some(pid) => run_pid(pid, &cli.command, &config),
        None => anyhow::bail!("需要指定 --snapshot 或 --pid"),
    }
}

#[cfg(target_os = "macos")]
fn cmd_check() -> Result<()> {
    use axquery::ax::macos::MacAccessibility;

    println!("检查辅助功能权限...");
    if MacAccessibility::check_permission() {
        println!("✓ 辅助功能权限已授权");
    } else {
        println!("✗ 辅助功能权限未授权，正在请求...");
        MacAccessibility::request_permission();
        println!("请在 系统设置 → 隐私与安全性 → 辅助功能 中授权 axquery");
    }
    Ok(())
}

#[cfg(not(target_os = "macos"))]
fn cmd_check() -> Result<()> {
    println!("当前平台没有辅助功能 API，仅支持 --snapshot");
    Ok(())
}

#[cfg(target_os = "macos")]
fn run_pid(pid: i32, command: &Commands, config: &AppConfig) -> Result<()> {
    use axquery::ax::macos::MacAccessibility;

    let api = MacAccessibility::new()?;
    let root = api
        .application_element(pid)
        .with_context(|| format!("Failed to connect to pid {}", pid))?;
    run(root, command, config)
}

#[cfg(not(target_os = "macos"))]
fn run_pid(_pid: i32, _command: &Commands, _config: &AppConfig) -> Result<()> {
    anyhow::bail!("--pid 仅在 macOS 上可用")
}

#[cfg(target_os = "macos")]
fn input_driver() -> Result<Box<dyn InputDriver>> {
    Ok(Box::new(axquery::ax::macos::CgEventInput::new()))
}

#[cfg(not(target_os = "macos"))]
fn input_driver() -> Result<Box<dyn InputDriver>> {
    anyhow::bail!("当前平台不支持鼠标输入")
}

fn run<A: Accessibility>(root: Element<A>, command: &Commands, config: &AppConfig) -> Result<()> {
    match command {
        Commands::Check => {}
        Commands::Tree { max_depth, json, .. } => {
            let depth = max_depth.unwrap_or(config.tree.max_depth);
            if *json {
                let snapshot = Snapshot::capture(&root, depth)?;
                println!("{}", snapshot.to_json()?);
            } else {
                print!("{}", root.dump_tree(depth)?);
            }
        }
        Commands::Graph { max_depth, .. } => {
            let mut builder = GraphBuilder::new().label_attributes(config.graph.label_attributes.clone());
            if let Some(depth) = max_depth {
                builder = builder.max_depth(*depth);
            }
            let graph = builder.build(&root)?;
            info!("Graph: {} nodes, {} edges", graph.node_count(), graph.edge_count());
            println!("{}", graph.to_dot());
        }
        Commands::Query { name, filter, set, .. } => {
            if let Some(raw) = set {
                let value: Literal = serde_json::from_str(raw).unwrap_or_else(|_| Literal::String(raw.clone()));
                root.request_set(name, value)?;
                println!("已设置 {}", name);
                return Ok(());
            }
            let qualifier = filter.as_deref().map(parse_filter).transpose()?;
            print_outcome(root.request(name, qualifier.as_ref())?);
        }
        Commands::Click { name, filter, .. } => {
            let qualifier = filter.as_deref().map(parse_filter).transpose()?;
            let target = match root.request(name, qualifier.as_ref())? {
                Outcome::Found(element) => element,
                Outcome::FoundAll(list) => list
                    .into_vec()
                    .into_iter()
                    .next()
                    .with_context(|| format!("没有找到 {}", name))?,
                _ => anyhow::bail!("{} 没有解析为元素搜索", name),
            };
            let mut driver = input_driver()?;
            let center = move_and_click(driver.as_mut(), &target, config.input.move_duration())?;
            println!("已点击 {} @ ({:.0},{:.0})", target.summary(), center.x, center.y);
        }
        Commands::At { x, y, .. } => {
            let element = Element::at_point(Rc::clone(root.api()), *x, *y)?;
            println!("{}", element.summary());
        }
    }
    Ok(())
}

fn parse_filter(raw: &str) -> Result<Qualifier> {
    let json: serde_json::Value = serde_json::from_str(raw).with_context(|| format!("Invalid filter JSON: {}", raw))?;
    Ok(Qualifier::from_json(&json)?)
}

fn print_outcome<A: Accessibility>(outcome: Outcome<A>) {
    match outcome {
        Outcome::Value(value) => println!("{}", value),
        Outcome::Performed(action) => println!("已执行 {}", action),
        Outcome::Found(element) => println!("{}", element.summary()),
        Outcome::FoundAll(list) => {
            println!("找到 {} 个元素:", list.len());
            for line in list.summaries() {
                println!("  {}", line);
            }
        }
    }
}
