extern crate tk_fetch;
extern crate argparse;
extern crate env_logger;
extern crate tokio_core;
#[macro_use] extern crate log;

use std::io::{self, Write};
use std::env;
use std::fs::File;
use std::path::{PathBuf, Path};
use std::process::exit;
use std::time::Duration;

use argparse::{ArgumentParser, Store, StoreOption, StoreFalse, List};
use argparse::ParseOption;
use tk_fetch::client::{Client, Config};


pub struct Options {
    pub url: String,
    pub method: String,
    pub data: Option<String>,
    pub headers: Vec<String>,
    pub dump_header: Option<PathBuf>,
    pub follow_redirects: bool,
    pub timeout: Option<u64>,
}


pub fn main() {
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "warn");
    }
    env_logger::init().unwrap();

    let mut opt = Options {
        url: String::new(),
        method: "GET".to_string(),
        data: None,
        headers: Vec::new(),
        dump_header: None,
        follow_redirects: true,
        timeout: None,
    };
    {
        let mut ap = ArgumentParser::new();
        ap.refer(&mut opt.url)
            .add_argument("url", Store, "
                Fetch specified url
            ").required();
        ap.refer(&mut opt.method)
            .add_option(&["-X", "--request"], Store,
                "Request method (default GET)");
        ap.refer(&mut opt.data)
            .add_option(&["-d", "--data"], StoreOption,
                "Send this string as a request body");
        ap.refer(&mut opt.headers)
            .add_option(&["-H", "--header"], List,
                "Add a header in the form `Name: value`");
        ap.refer(&mut opt.dump_header)
            .add_option(&["-D", "--dump-header"], ParseOption,
                "Write response head to the file (`-` for stdout)");
        ap.refer(&mut opt.follow_redirects)
            .add_option(&["--no-redirect"], StoreFalse,
                "Don't follow redirects");
        ap.refer(&mut opt.timeout)
            .add_option(&["--connect-timeout"], StoreOption,
                "Connection timeout in milliseconds");
        ap.parse_args_or_exit();
    }

    let headers = opt.headers.iter().map(|h| {
        match h.find(':') {
            Some(idx) => (h[..idx].trim(), h[idx+1..].trim()),
            None => {
                writeln!(&mut io::stderr(), "Bad header {:?}", h).ok();
                exit(1);
            }
        }
    }).collect::<Vec<_>>();

    let mut cfg = Config::new();
    cfg.follow_redirects(opt.follow_redirects);
    if let Some(ms) = opt.timeout {
        cfg.timeout(Duration::from_millis(ms));
    }

    let mut lp = tokio_core::reactor::Core::new().expect("loop created");
    let client = Client::tcp(&lp.handle());
    let body = opt.data.map(|x| x.into_bytes());

    let response = match lp.run(client.request(&opt.method, &opt.url,
        &headers, body, cfg.done()))
    {
        Ok(response) => response,
        Err(e) => {
            error!("Error fetching {}: {}", opt.url, e);
            exit(2);
        }
    };
    if let Some(filename) = opt.dump_header {
        let mut out: Box<io::Write> = if filename == Path::new("-") {
            Box::new(io::stdout())
        } else {
            Box::new(
                File::create(filename).expect("can't open file for headers"))
        };
        writeln!(&mut out, "HTTP/1.1 {} {}",
            response.code(), response.reason()).unwrap();
        for &(ref k, ref v) in response.headers() {
            writeln!(&mut out, "{}: {}", k, v).unwrap();
        }
        writeln!(&mut out, "").unwrap();
    }
    io::stdout().write_all(response.body()).unwrap();
}
