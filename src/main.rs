// This file is part of the untouch package.
//
// For the full copyright and license information, please view the LICENSE
// file that was distributed with this source code.

fn main() {
    std::process::exit(untouch::uumain(std::env::args()));
}
